use std::collections::HashSet;
use std::fmt;

use crate::error::ValidationError;

/// A synthetic user, identified by the phone number used to log in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Consecutive numeric identities starting at `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRange {
    base: u64,
    count: usize,
}

impl IdentityRange {
    /// Builds a range, rejecting one whose last identity would overflow `u64`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityRangeOverflow` when `base + count - 1` does not fit.
    pub fn new(base: u64, count: usize) -> Result<Self, ValidationError> {
        let span = u64::try_from(count.saturating_sub(1))
            .map_err(|_err| ValidationError::IdentityRangeOverflow { base, count })?;
        if base.checked_add(span).is_none() {
            return Err(ValidationError::IdentityRangeOverflow { base, count });
        }
        Ok(Self { base, count })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Materializes the range in ascending order.
    #[must_use]
    pub fn identities(&self) -> Vec<Identity> {
        (0..self.count)
            .filter_map(|offset| u64::try_from(offset).ok())
            .filter_map(|offset| self.base.checked_add(offset))
            .map(|phone| Identity(phone.to_string()))
            .collect()
    }
}

/// Authorization token returned by the login endpoint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "Token({}…)", prefix)
    }
}

/// An identity paired with the token that authorizes its purchases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    identity: Identity,
    token: Token,
}

impl Credential {
    #[must_use]
    pub const fn new(identity: Identity, token: Token) -> Self {
        Self { identity, token }
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub const fn token(&self) -> &Token {
        &self.token
    }
}

/// Rejects a list in which any identity repeats.
///
/// # Errors
///
/// Returns `DuplicateIdentity` naming the first repeated identity.
pub fn ensure_unique<'item>(
    identities: impl IntoIterator<Item = &'item Identity>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for identity in identities {
        if !seen.insert(identity) {
            return Err(ValidationError::DuplicateIdentity {
                identity: identity.to_string(),
            });
        }
    }
    Ok(())
}

/// Rejects a credential set in which two identities share one token.
///
/// # Errors
///
/// Returns `SharedToken` naming the second identity holding the token.
pub fn ensure_distinct_tokens(credentials: &[Credential]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for credential in credentials {
        if !seen.insert(credential.token()) {
            return Err(ValidationError::SharedToken {
                identity: credential.identity().to_string(),
            });
        }
    }
    Ok(())
}
