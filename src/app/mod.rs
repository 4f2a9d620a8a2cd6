//! One runner per CLI action.
mod admin;
mod context;
mod runner;

pub(crate) use admin::{run_add_voucher, run_reset};
pub(crate) use runner::{interruptible, run_flash_sale, run_provision, run_purchase};
