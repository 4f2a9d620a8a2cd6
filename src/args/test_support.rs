use clap::Parser;

use crate::error::{AppError, AppResult};

use super::FlashArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<FlashArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    FlashArgs::try_parse_from(args).map_err(AppError::from)
}
