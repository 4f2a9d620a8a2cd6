use async_trait::async_trait;
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::domain::{Identity, Token, VoucherId};
use crate::error::{ApiError, ValidationError};

use super::{AuthApi, Envelope, Payload, PurchaseApi, SeckillVoucher};

const SEND_CODE: &str = "send-code";
const LOGIN: &str = "login";
const PURCHASE: &str = "purchase";
const ADD_VOUCHER: &str = "add-voucher";

/// Fully resolved endpoint URLs.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    send_code: String,
    login: String,
    purchase_prefix: String,
    voucher: String,
}

impl ApiEndpoints {
    /// Joins the base URL with each endpoint path.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL does not parse or is not http(s).
    pub fn new(
        base_url: &str,
        send_code_path: &str,
        login_path: &str,
        purchase_path: &str,
        voucher_path: &str,
    ) -> Result<Self, ValidationError> {
        let parsed = Url::parse(base_url).map_err(|err| ValidationError::InvalidUrl {
            url: base_url.to_owned(),
            source: err,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedUrlScheme {
                url: base_url.to_owned(),
            });
        }
        let base = base_url.trim_end_matches('/');
        let join = |path: &str| format!("{}/{}", base, path.trim_start_matches('/'));
        Ok(Self {
            send_code: join(send_code_path),
            login: join(login_path),
            purchase_prefix: join(purchase_path).trim_end_matches('/').to_owned(),
            voucher: join(voucher_path),
        })
    }

    #[must_use]
    pub fn purchase_url(&self, voucher: &VoucherId) -> String {
        format!("{}/{}", self.purchase_prefix, voucher.as_str())
    }
}

/// `reqwest`-backed implementation of the remote API.
///
/// The client is cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFlashSaleApi {
    client: Client,
    endpoints: ApiEndpoints,
}

impl HttpFlashSaleApi {
    #[must_use]
    pub const fn new(client: Client, endpoints: ApiEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Creates a seckill voucher, authorized by an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, an undecodable body, or a
    /// response with `success=false`.
    pub async fn add_voucher(
        &self,
        token: &Token,
        voucher: &SeckillVoucher,
    ) -> Result<Payload, ApiError> {
        let response = self
            .client
            .post(&self.endpoints.voucher)
            .header(AUTHORIZATION, token.as_str())
            .json(voucher)
            .send()
            .await
            .map_err(|err| ApiError::from_reqwest(ADD_VOUCHER, err))?;
        let envelope = read_envelope(ADD_VOUCHER, response).await?;
        if !envelope.success {
            return Err(ApiError::Rejected {
                endpoint: ADD_VOUCHER,
                message: envelope.data.to_string(),
            });
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl AuthApi for HttpFlashSaleApi {
    async fn send_code(&self, identity: &Identity) -> Result<(), ApiError> {
        let response = self
            .client
            .post(&self.endpoints.send_code)
            .query(&[("phone", identity.as_str())])
            .send()
            .await
            .map_err(|err| ApiError::from_reqwest(SEND_CODE, err))?;
        ensure_success(SEND_CODE, &response)?;
        debug!("Verification code requested for {}", identity);
        Ok(())
    }

    async fn login(&self, identity: &Identity, code: &str) -> Result<Token, ApiError> {
        let response = self
            .client
            .post(&self.endpoints.login)
            .json(&json!({ "phone": identity.as_str(), "code": code }))
            .send()
            .await
            .map_err(|err| ApiError::from_reqwest(LOGIN, err))?;
        let envelope = read_envelope(LOGIN, response).await?;
        if envelope.success
            && let Payload::Text(token) = &envelope.data
            && !token.is_empty()
        {
            return Ok(Token::new(token.as_str()));
        }
        Err(ApiError::Rejected {
            endpoint: LOGIN,
            message: envelope.data.to_string(),
        })
    }
}

#[async_trait]
impl PurchaseApi for HttpFlashSaleApi {
    async fn purchase(&self, token: &Token, voucher: &VoucherId) -> Result<Envelope, ApiError> {
        let response = self
            .client
            .post(self.endpoints.purchase_url(voucher))
            .header(AUTHORIZATION, token.as_str())
            .send()
            .await
            .map_err(|err| ApiError::from_reqwest(PURCHASE, err))?;
        read_envelope(PURCHASE, response).await
    }
}

fn ensure_success(endpoint: &'static str, response: &reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(ApiError::UnexpectedStatus {
        endpoint,
        status: status.as_u16(),
    })
}

/// Decodes the envelope of a 2xx response; any other status is a failure
/// even when its body is a well-formed envelope.
async fn read_envelope(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<Envelope, ApiError> {
    ensure_success(endpoint, &response)?;
    let body = response
        .bytes()
        .await
        .map_err(|err| ApiError::from_reqwest(endpoint, err))?;
    Envelope::from_slice(&body).map_err(|err| ApiError::Decode {
        endpoint,
        source: err,
    })
}
