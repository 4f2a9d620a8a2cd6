mod api;
mod app;
mod config;
mod credentials;
mod validation;

#[cfg(test)]
mod test_support;

pub use api::ApiError;
pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use credentials::CredentialError;
pub use validation::ValidationError;
