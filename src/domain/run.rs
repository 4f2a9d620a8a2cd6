use std::fmt;
use std::time::Duration;

/// Identifier of the contested seckill voucher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherId(String);

impl VoucherId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoucherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long each credential keeps purchasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One request per credential.
    FireOnce,
    /// Tight request loops until the window closes.
    Sustained(Duration),
}

impl RunMode {
    #[must_use]
    pub const fn from_duration(duration: Duration) -> Self {
        if duration.is_zero() {
            RunMode::FireOnce
        } else {
            RunMode::Sustained(duration)
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunMode::FireOnce => "fire-once",
            RunMode::Sustained(_) => "sustained",
        }
    }
}
