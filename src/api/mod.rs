//! Adapters for the remote flash-sale API and its verification-code cache.
mod cache;
mod envelope;
mod http;
mod traits;
mod voucher;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheCodeSource, CacheSettings, RespCache, RespValue};
pub use envelope::{Envelope, NULL_PAYLOAD, Payload};
pub use http::{ApiEndpoints, HttpFlashSaleApi};
pub use traits::{AuthApi, CodeSource, PurchaseApi};
pub use voucher::SeckillVoucher;
