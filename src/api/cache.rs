use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::domain::Identity;
use crate::error::ApiError;

use super::CodeSource;

const CACHE: &str = "cache";
/// Trailing `\r\n` after a bulk string body.
const CRLF_LEN: usize = 2;
/// Largest bulk string a RESP server may send (512 MiB).
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;
/// Elements reserved up front for an array reply; longer arrays grow.
const ARRAY_PREALLOC: usize = 64;

/// Connection settings for the RESP cache that holds verification codes.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub address: String,
    pub password: Option<String>,
    pub db: u32,
    /// Connect and per-command reply timeout; zero waits indefinitely.
    pub timeout: Duration,
}

/// Reply frames this client understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    Simple(String),
    Integer(i64),
    Bulk(Option<Vec<u8>>),
    /// Flat array of scalar frames; nested arrays are rejected.
    Array(Option<Vec<RespValue>>),
}

/// Minimal RESP client: one connection per command, optional AUTH/SELECT.
#[derive(Debug, Clone)]
pub struct RespCache {
    settings: CacheSettings,
}

impl RespCache {
    #[must_use]
    pub const fn new(settings: CacheSettings) -> Self {
        Self { settings }
    }

    /// Runs one command on a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection fails, times out, or the server
    /// replies with an error frame.
    pub async fn run(&self, args: &[&str]) -> Result<RespValue, ApiError> {
        let mut conn = self.open().await?;
        self.exchange(&mut conn, args).await
    }

    /// `GET key`, mapping a nil reply to `None`.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a non-bulk reply.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.run(&["GET", key]).await? {
            RespValue::Bulk(None) => Ok(None),
            RespValue::Bulk(Some(bytes)) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|err| ApiError::Cache {
                    message: format!("GET {} returned non UTF-8 data: {}", key, err),
                }),
            other @ (RespValue::Simple(_) | RespValue::Integer(_) | RespValue::Array(_)) => {
                Err(unexpected("GET", &other))
            }
        }
    }

    /// `KEYS pattern`, returning the matching key names.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a reply that is not an
    /// array of bulk strings.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, ApiError> {
        match self.run(&["KEYS", pattern]).await? {
            RespValue::Array(None) => Ok(Vec::new()),
            RespValue::Array(Some(items)) => items
                .into_iter()
                .map(|item| match item {
                    RespValue::Bulk(Some(bytes)) => {
                        String::from_utf8(bytes).map_err(|err| ApiError::Cache {
                            message: format!("KEYS {} returned non UTF-8 key: {}", pattern, err),
                        })
                    }
                    other => Err(unexpected("KEYS", &other)),
                })
                .collect(),
            other @ (RespValue::Simple(_) | RespValue::Integer(_) | RespValue::Bulk(_)) => {
                Err(unexpected("KEYS", &other))
            }
        }
    }

    /// `SET key value`.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a reply other than `OK`.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        expect_ok("SET", self.run(&["SET", key, value]).await?)
    }

    /// `DEL key [key ...]`, returning how many keys were removed.
    ///
    /// An empty key list removes nothing and sends no command.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a non-integer reply.
    pub async fn del<K>(&self, keys: &[K]) -> Result<i64, ApiError>
    where
        K: AsRef<str>,
    {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut args = Vec::with_capacity(keys.len().saturating_add(1));
        args.push("DEL");
        args.extend(keys.iter().map(|key| key.as_ref()));
        match self.run(&args).await? {
            RespValue::Integer(removed) => Ok(removed),
            other @ (RespValue::Simple(_) | RespValue::Bulk(_) | RespValue::Array(_)) => {
                Err(unexpected("DEL", &other))
            }
        }
    }

    async fn open(&self) -> Result<BufReader<TcpStream>, ApiError> {
        let stream = within(
            self.settings.timeout,
            TcpStream::connect(self.settings.address.as_str()),
        )
        .await?
        .map_err(|err| ApiError::Transport {
            endpoint: CACHE,
            source: Box::new(err),
        })?;
        let mut conn = BufReader::new(stream);

        if let Some(password) = self.settings.password.as_deref() {
            let reply = self.exchange(&mut conn, &["AUTH", password]).await?;
            expect_ok("AUTH", reply)?;
        }
        if self.settings.db != 0 {
            let db = self.settings.db.to_string();
            let reply = self.exchange(&mut conn, &["SELECT", db.as_str()]).await?;
            expect_ok("SELECT", reply)?;
        }
        Ok(conn)
    }

    async fn exchange(
        &self,
        conn: &mut BufReader<TcpStream>,
        args: &[&str],
    ) -> Result<RespValue, ApiError> {
        let frame = encode_command(args);
        let roundtrip = async {
            conn.get_mut()
                .write_all(&frame)
                .await
                .map_err(|err| ApiError::cache_io(&err))?;
            read_value(conn).await
        };
        within(self.settings.timeout, roundtrip).await?
    }
}

/// Bounds `future` by `limit`; a zero limit waits indefinitely.
async fn within<F>(limit: Duration, future: F) -> Result<F::Output, ApiError>
where
    F: Future,
{
    if limit.is_zero() {
        return Ok(future.await);
    }
    timeout(limit, future)
        .await
        .map_err(|_elapsed| ApiError::Timeout { endpoint: CACHE })
}

/// Reads verification codes stored under `{key_prefix}{identity}`.
#[derive(Debug, Clone)]
pub struct CacheCodeSource {
    cache: RespCache,
    key_prefix: String,
}

impl CacheCodeSource {
    #[must_use]
    pub fn new(cache: RespCache, key_prefix: impl Into<String>) -> Self {
        Self {
            cache,
            key_prefix: key_prefix.into(),
        }
    }
}

#[async_trait]
impl CodeSource for CacheCodeSource {
    async fn fetch_code(&self, identity: &Identity) -> Result<String, ApiError> {
        let key = format!("{}{}", self.key_prefix, identity);
        let code = self.cache.get(&key).await?;
        match code {
            Some(code) if !code.is_empty() => {
                debug!("Fetched verification code for {}", identity);
                Ok(code)
            }
            Some(_) | None => Err(ApiError::CodeMissing {
                identity: identity.to_string(),
            }),
        }
    }
}

pub(crate) fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut frame = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        frame.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        frame.extend_from_slice(arg.as_bytes());
        frame.extend_from_slice(b"\r\n");
    }
    frame
}

pub(crate) async fn read_value<R>(reader: &mut R) -> Result<RespValue, ApiError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader).await?;
    let Some(rest) = line.strip_prefix('*') else {
        return read_scalar(reader, &line).await;
    };
    let Some(len) = frame_len(&line, rest)? else {
        return Ok(RespValue::Array(None));
    };
    let mut items = Vec::with_capacity(len.min(ARRAY_PREALLOC));
    for _ in 0..len {
        let item_line = read_line(reader).await?;
        if item_line.starts_with('*') {
            return Err(ApiError::Cache {
                message: format!("nested array reply '{}' is not supported", item_line),
            });
        }
        items.push(read_scalar(reader, &item_line).await?);
    }
    Ok(RespValue::Array(Some(items)))
}

/// Decodes one non-array frame whose header line was already read.
async fn read_scalar<R>(reader: &mut R, line: &str) -> Result<RespValue, ApiError>
where
    R: AsyncBufRead + Unpin,
{
    let mut chars = line.chars();
    let kind = chars.next();
    let rest = chars.as_str();
    match kind {
        Some('+') => Ok(RespValue::Simple(rest.to_owned())),
        Some('-') => Err(ApiError::Cache {
            message: rest.to_owned(),
        }),
        Some(':') => rest
            .parse::<i64>()
            .map(RespValue::Integer)
            .map_err(|err| protocol_error(line, &err)),
        Some('$') => {
            let Some(body_len) = frame_len(line, rest)? else {
                return Ok(RespValue::Bulk(None));
            };
            if body_len > MAX_BULK_LEN {
                return Err(ApiError::Cache {
                    message: format!(
                        "bulk reply of {} bytes exceeds the {} byte limit",
                        body_len, MAX_BULK_LEN
                    ),
                });
            }
            let mut body = vec![0_u8; body_len.saturating_add(CRLF_LEN)];
            reader
                .read_exact(&mut body)
                .await
                .map_err(|err| ApiError::cache_io(&err))?;
            body.truncate(body_len);
            Ok(RespValue::Bulk(Some(body)))
        }
        Some(_) | None => Err(ApiError::Cache {
            message: format!("unsupported reply '{}'", line),
        }),
    }
}

/// Parses a bulk or array length; negative means nil.
fn frame_len(line: &str, rest: &str) -> Result<Option<usize>, ApiError> {
    let len = rest
        .parse::<i64>()
        .map_err(|err| protocol_error(line, &err))?;
    if len < 0 {
        return Ok(None);
    }
    usize::try_from(len)
        .map(Some)
        .map_err(|err| protocol_error(line, &err))
}

async fn read_line<R>(reader: &mut R) -> Result<String, ApiError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = reader
        .read_until(b'\n', &mut buf)
        .await
        .map_err(|err| ApiError::cache_io(&err))?;
    if read == 0 {
        return Err(ApiError::Cache {
            message: "connection closed before reply".to_owned(),
        });
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|err| ApiError::Cache {
        message: format!("reply is not UTF-8: {}", err),
    })
}

fn expect_ok(command: &str, reply: RespValue) -> Result<(), ApiError> {
    match reply {
        RespValue::Simple(text) if text == "OK" => Ok(()),
        other @ (RespValue::Simple(_)
        | RespValue::Integer(_)
        | RespValue::Bulk(_)
        | RespValue::Array(_)) => Err(unexpected(command, &other)),
    }
}

fn unexpected(command: &str, reply: &RespValue) -> ApiError {
    ApiError::Cache {
        message: format!("unexpected {} reply: {:?}", command, reply),
    }
}

fn protocol_error(line: &str, err: &dyn std::fmt::Display) -> ApiError {
    ApiError::Cache {
        message: format!("malformed reply '{}': {}", line, err),
    }
}
