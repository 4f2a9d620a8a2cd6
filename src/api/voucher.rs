use serde::Serialize;

/// Body of the "add seckill voucher" admin endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeckillVoucher {
    pub shop_id: u64,
    pub title: String,
    pub sub_title: String,
    pub rules: String,
    pub pay_value: u64,
    pub actual_value: u64,
    #[serde(rename = "type")]
    pub kind: u8,
    pub stock: u64,
    pub begin_time: String,
    pub end_time: String,
}
