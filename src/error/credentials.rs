use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to open credential file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to remove credential file '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to append to credential file '{path}': {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to flush credential file '{path}': {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read credential file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(
        "Malformed credential record at '{path}' line {line}: expected 'identity,token', found {fields} field(s)."
    )]
    Record {
        path: PathBuf,
        line: u64,
        fields: usize,
    },
    #[error("Credential file '{path}' has no credentials.")]
    Empty { path: PathBuf },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
