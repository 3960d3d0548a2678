//! Dataset locations and the single-shot fetch.

use std::fmt;
use std::path::PathBuf;

use crate::LoadError;

/// Where a dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched over HTTP(S).
    Url(String),
    /// Read from the local filesystem.
    Path(PathBuf),
}

impl DataSource {
    /// Interprets a configured location. Strings starting with `http://`
    /// or `https://` are URLs, everything else is a file path.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A completed fetch: the status code and, on success, the body.
#[derive(Debug)]
pub(crate) struct Fetched {
    pub status: u16,
    pub body: String,
}

/// Fetches one dataset. A non-success HTTP status is not an error here;
/// it is reported back so the caller can report both statuses together.
/// File sources report `200` once read.
pub(crate) async fn fetch(
    client: &reqwest::Client,
    source: &DataSource,
) -> Result<Fetched, LoadError> {
    match source {
        DataSource::Url(url) => {
            let resp = client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                log::error!("GET {url} failed with status {status}");
                return Ok(Fetched {
                    status: status.as_u16(),
                    body: String::new(),
                });
            }
            let body = resp.text().await?;
            log::debug!("GET {url}: {status}, {} bytes", body.len());
            Ok(Fetched {
                status: status.as_u16(),
                body,
            })
        }
        DataSource::Path(path) => {
            let body = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            log::debug!("Read {} ({} bytes)", path.display(), body.len());
            Ok(Fetched { status: 200, body })
        }
    }
}
