//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

pub use cli::FlashArgs;
pub use types::{Action, OutputFormat, PositiveUsize};

pub(crate) use defaults::DEFAULT_USER_AGENT;
pub(crate) use parsers::parse_duration_arg;
