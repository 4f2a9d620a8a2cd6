use async_trait::async_trait;

use crate::domain::{Identity, Token, VoucherId};
use crate::error::ApiError;

use super::Envelope;

/// Login half of the remote API.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Asks the server to issue a verification code for `identity`.
    async fn send_code(&self, identity: &Identity) -> Result<(), ApiError>;

    /// Exchanges a verification code for an authorization token.
    async fn login(&self, identity: &Identity, code: &str) -> Result<Token, ApiError>;
}

/// Side channel that exposes issued verification codes.
#[async_trait]
pub trait CodeSource: Send + Sync {
    async fn fetch_code(&self, identity: &Identity) -> Result<String, ApiError>;
}

/// Purchase half of the remote API.
#[async_trait]
pub trait PurchaseApi: Send + Sync {
    /// Issues one purchase attempt and returns the decoded envelope.
    ///
    /// Transport failures and undecodable bodies surface as `ApiError`;
    /// business rejections come back as an envelope with `success=false`.
    async fn purchase(&self, token: &Token, voucher: &VoucherId) -> Result<Envelope, ApiError>;
}
