//! Core value types shared by provisioning, load driving, and storage.
mod credential;
mod run;

pub use credential::{
    Credential, Identity, IdentityRange, Token, ensure_distinct_tokens, ensure_unique,
};
pub use run::{RunMode, VoucherId};
