//! Getting generated images out of the app: saving them as files and putting
//! them on the clipboard. Both start by fetching the image behind a url.

use std::{fmt, pin::Pin};

use bytes::Bytes;
use color_eyre::Result;
use log::debug;
use reqwest::{Client, header};

pub mod clipboard;
pub mod copy;
pub mod download;
pub mod raster;

pub use clipboard::{Clipboard, SystemClipboard};
pub use copy::{CopyOutcome, CopyTier, TierOutcome, copy_image};
pub use download::{DirectoryTarget, SaveTarget, download};

pub const PNG_MIME: &str = "image/png";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Fetched bytes together with their content type.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: String,
    pub bytes: Bytes,
}

impl Blob {
    pub fn new(mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Derives the content type from the leading bytes.
    pub fn sniffed(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or(FALLBACK_MIME);
        Self::new(mime, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub trait Fetch: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str)
    -> Pin<Box<dyn Future<Output = Result<Blob>> + Send + 'a>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Blob>> + Send + 'a>> {
        Box::pin(async move {
            let res = self.client.get(url).send().await?.error_for_status()?;
            let mime = res
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
            let bytes = res.bytes().await?;
            debug!("Fetched {} bytes ({mime:?}) from {url}", bytes.len());

            Ok(match mime {
                Some(mime) if !mime.is_empty() => Blob::new(mime, bytes),
                _ => Blob::sniffed(bytes),
            })
        })
    }
}
