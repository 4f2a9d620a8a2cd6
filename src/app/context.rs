use std::sync::Arc;

use crate::api::{ApiEndpoints, CacheCodeSource, CacheSettings, HttpFlashSaleApi, RespCache};
use crate::args::FlashArgs;
use crate::credentials::CredentialStore;
use crate::domain::VoucherId;
use crate::error::{AppResult, ValidationError};
use crate::http::{ClientSettings, build_client};
use crate::provision::ProvisionSettings;

pub(super) fn http_api(args: &FlashArgs) -> AppResult<Arc<HttpFlashSaleApi>> {
    let base_url = args
        .base_url
        .as_deref()
        .ok_or(ValidationError::MissingBaseUrl)?;
    let endpoints = ApiEndpoints::new(
        base_url,
        &args.send_code_path,
        &args.login_path,
        &args.purchase_path,
        &args.voucher_path,
    )?;
    let client = build_client(&ClientSettings::from_args(args))?;
    Ok(Arc::new(HttpFlashSaleApi::new(client, endpoints)))
}

pub(super) fn cache(args: &FlashArgs) -> RespCache {
    RespCache::new(CacheSettings {
        address: args.cache_address.clone(),
        password: args.cache_password.clone(),
        db: args.cache_db,
        timeout: args.cache_timeout,
    })
}

pub(super) fn code_source(args: &FlashArgs) -> Arc<CacheCodeSource> {
    Arc::new(CacheCodeSource::new(cache(args), args.code_key_prefix.as_str()))
}

pub(super) fn voucher_id(args: &FlashArgs) -> Result<VoucherId, ValidationError> {
    match args.voucher.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(VoucherId::new(id)),
        _ => Err(ValidationError::MissingVoucher),
    }
}

pub(super) fn credential_store(args: &FlashArgs) -> CredentialStore {
    CredentialStore::new(args.credentials_file.as_str())
}

pub(super) const fn provision_settings(args: &FlashArgs) -> ProvisionSettings {
    ProvisionSettings {
        batch_size: args.batch_size,
        batch_delay: args.batch_delay,
    }
}
