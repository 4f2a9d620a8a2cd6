//! CSV credential file: one `identity,token` row per session.
//!
//! Provisioning appends to the file, so a file can hold several runs' worth
//! of sessions; loading keeps the newest token per identity.
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::fs::File;
use std::io::{ErrorKind, Read as _, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::{Credential, Identity, Token};
use crate::error::CredentialError;


#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row per credential, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or written.
    pub fn append(&self, credentials: &[Credential]) -> Result<(), CredentialError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| CredentialError::Open {
                path: self.path.clone(),
                source: err,
            })?;
        // Rows written by other tools may lack the final newline.
        if lacks_final_newline(&mut file).map_err(|err| CredentialError::Open {
            path: self.path.clone(),
            source: err,
        })? {
            file.write_all(b"\n").map_err(|err| CredentialError::Flush {
                path: self.path.clone(),
                source: err,
            })?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for credential in credentials {
            writer
                .write_record([credential.identity().as_str(), credential.token().as_str()])
                .map_err(|err| CredentialError::Append {
                    path: self.path.clone(),
                    source: err,
                })?;
        }
        writer.flush().map_err(|err| CredentialError::Flush {
            path: self.path.clone(),
            source: err,
        })?;
        info!(
            "Appended {} credentials to {}",
            credentials.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Reads every stored credential.
    ///
    /// Identities are returned in first-seen order; when an identity appears
    /// more than once the last row's token wins. An empty file yields an empty
    /// list.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened, is not valid CSV, or contains a
    /// row with fewer than two fields.
    pub fn load(&self) -> Result<Vec<Credential>, CredentialError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|err| self.open_error(err))?;

        let mut order: Vec<Identity> = Vec::new();
        let mut tokens: HashMap<Identity, Token> = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|err| CredentialError::Read {
                path: self.path.clone(),
                source: err,
            })?;
            let line = record.position().map_or(0, csv::Position::line);
            let (Some(identity), Some(token)) = (record.get(0), record.get(1)) else {
                return Err(CredentialError::Record {
                    path: self.path.clone(),
                    line,
                    fields: record.len(),
                });
            };
            if identity.is_empty() || token.is_empty() {
                return Err(CredentialError::Record {
                    path: self.path.clone(),
                    line,
                    fields: record.iter().filter(|field| !field.is_empty()).count(),
                });
            }
            let identity = Identity::new(identity);
            if tokens.insert(identity.clone(), Token::new(token)).is_none() {
                order.push(identity);
            }
        }

        let credentials: Vec<Credential> = order
            .into_iter()
            .filter_map(|identity| {
                let token = tokens.remove(&identity)?;
                Some(Credential::new(identity, token))
            })
            .collect();
        debug!(
            "Loaded {} credentials from {}",
            credentials.len(),
            self.path.display()
        );
        Ok(credentials)
    }

    /// Like [`load`](Self::load), but an empty file is an error.
    ///
    /// # Errors
    ///
    /// Everything `load` fails on, plus `Empty`.
    pub fn load_non_empty(&self) -> Result<Vec<Credential>, CredentialError> {
        let credentials = self.load()?;
        if credentials.is_empty() {
            return Err(CredentialError::Empty {
                path: self.path.clone(),
            });
        }
        Ok(credentials)
    }

    /// Deletes the file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be removed.
    pub fn remove(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed stale credential file {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CredentialError::Remove {
                path: self.path.clone(),
                source: err,
            }),
        }
    }

    fn open_error(&self, err: csv::Error) -> CredentialError {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => CredentialError::Open {
                path: self.path.clone(),
                source,
            },
            other => CredentialError::Open {
                path: self.path.clone(),
                source: std::io::Error::other(format!("{:?}", other)),
            },
        }
    }
}

fn lacks_final_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last != *b"\n")
}
