use super::{ApiError, ConfigError, CredentialError, ValidationError};

impl From<&'static str> for ValidationError {
    fn from(message: &'static str) -> Self {
        ValidationError::TestExpectation { message }
    }
}

impl From<String> for ValidationError {
    fn from(value: String) -> Self {
        ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ConfigError {
    fn from(message: &'static str) -> Self {
        ConfigError::TestExpectation { message }
    }
}

impl From<String> for ConfigError {
    fn from(value: String) -> Self {
        ConfigError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ApiError {
    fn from(message: &'static str) -> Self {
        ApiError::TestExpectation { message }
    }
}

impl From<String> for ApiError {
    fn from(value: String) -> Self {
        ApiError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for CredentialError {
    fn from(message: &'static str) -> Self {
        CredentialError::TestExpectation { message }
    }
}

impl From<String> for CredentialError {
    fn from(value: String) -> Self {
        CredentialError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
