use std::path::PathBuf;

use anyhow::Context;

use crate::assets::source::local_path;
use crate::foundation::error::{LuminaError, LuminaResult};
use crate::layers::model::SourceRef;

/// Resolves a [`SourceRef`] to encoded image bytes.
///
/// Implementations are called from worker threads.
pub trait ImageFetcher: Send + Sync {
    /// Fetch the encoded bytes behind `source`.
    fn fetch(&self, source: &SourceRef) -> LuminaResult<Vec<u8>>;
}

/// Reads local files, resolving relative sources against a root directory.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageFetcher for FsFetcher {
    fn fetch(&self, source: &SourceRef) -> LuminaResult<Vec<u8>> {
        if source.is_remote() {
            return Err(LuminaError::load(format!(
                "'{source}' is remote; FsFetcher only reads local files"
            )));
        }
        let path = local_path(&self.root, source);
        std::fs::read(&path)
            .with_context(|| format!("read image bytes from '{}'", path.display()))
            .map_err(LuminaError::from)
    }
}

/// Downloads `http(s)://` sources with a blocking client.
#[cfg(feature = "http")]
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Client with a per-request timeout.
    pub fn new(timeout: std::time::Duration) -> LuminaResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl ImageFetcher for HttpFetcher {
    fn fetch(&self, source: &SourceRef) -> LuminaResult<Vec<u8>> {
        let resp = self
            .client
            .get(source.as_str())
            .send()
            .with_context(|| format!("GET {source}"))?
            .error_for_status()
            .with_context(|| format!("GET {source}"))?;
        let bytes = resp.bytes().with_context(|| format!("read body of {source}"))?;
        Ok(bytes.to_vec())
    }
}

/// Local files through [`FsFetcher`]; remote sources through `HttpFetcher` when the `http`
/// feature is enabled, otherwise they fail and the layer is skipped.
#[derive(Clone, Debug)]
pub struct DefaultFetcher {
    fs: FsFetcher,
    #[cfg(feature = "http")]
    http: HttpFetcher,
}

impl DefaultFetcher {
    /// Fetcher resolving local sources against `root`.
    pub fn new(root: impl Into<PathBuf>) -> LuminaResult<Self> {
        Ok(Self {
            fs: FsFetcher::new(root),
            #[cfg(feature = "http")]
            http: HttpFetcher::new(std::time::Duration::from_secs(30))?,
        })
    }
}

impl ImageFetcher for DefaultFetcher {
    fn fetch(&self, source: &SourceRef) -> LuminaResult<Vec<u8>> {
        if !source.is_remote() {
            return self.fs.fetch(source);
        }

        #[cfg(feature = "http")]
        {
            self.http.fetch(source)
        }
        #[cfg(not(feature = "http"))]
        {
            Err(LuminaError::load(format!(
                "cannot fetch '{source}': remote sources require the `http` feature"
            )))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
