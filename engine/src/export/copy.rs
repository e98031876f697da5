//! Copying a generated image with decreasing guarantees:
//!
//! ```text
//! Start ─▶ Image ─fallback─▶ Raster ─fallback─▶ Text ─fail─▶ Failed
//!            │                 │                  │
//!            └─ImageCopied     └─ImageCopied      └─UrlCopied
//! ```
//!
//! Every tier runs at most once per call. Each tier is its own function so the
//! transitions can be forced one by one.

use log::{info, warn};

use super::{Clipboard, Fetch, raster::Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTier {
    /// The fetched bytes, in their native content type.
    Image,
    /// Decoded onto an offscreen surface and re-encoded as PNG.
    Raster,
    /// Only the url.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOutcome {
    /// Number of bytes written to the clipboard.
    Success(usize),
    Fallback,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    ImageCopied { via: CopyTier, bytes: usize },
    UrlCopied,
    Failed,
}

impl CopyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CopyOutcome::ImageCopied { .. } => "Image copied to clipboard!",
            CopyOutcome::UrlCopied => {
                "Could not copy image directly. Image URL copied to clipboard instead!"
            }
            CopyOutcome::Failed => "Failed to copy image. Try downloading instead.",
        }
    }
}

pub async fn try_image_copy(
    url: &str,
    fetcher: &dyn Fetch,
    clipboard: &dyn Clipboard,
) -> TierOutcome {
    let blob = match fetcher.fetch(url).await {
        Ok(blob) => blob,
        Err(e) => {
            warn!("Fetching {url} for copy failed: {e:?}");
            return TierOutcome::Fallback;
        }
    };

    match clipboard.write_image(&blob) {
        Ok(()) => TierOutcome::Success(blob.len()),
        Err(e) => {
            warn!("Direct image copy failed: {e:?}");
            TierOutcome::Fallback
        }
    }
}

pub async fn try_raster_copy(
    url: &str,
    fetcher: &dyn Fetch,
    clipboard: &dyn Clipboard,
) -> TierOutcome {
    let blob = match fetcher.fetch(url).await {
        Ok(blob) => blob,
        Err(e) => {
            warn!("Loading {url} for rasterizing failed: {e:?}");
            return TierOutcome::Fallback;
        }
    };

    let png = match Surface::load(&blob.bytes).and_then(|surface| surface.encode_png()) {
        Ok(png) => png,
        Err(e) => {
            warn!("Rasterizing {url} failed: {e:?}");
            return TierOutcome::Fallback;
        }
    };

    match clipboard.write_image(&png) {
        Ok(()) => TierOutcome::Success(png.len()),
        Err(e) => {
            warn!("Copying rasterized image failed: {e:?}");
            TierOutcome::Fallback
        }
    }
}

pub fn try_text_copy(url: &str, clipboard: &dyn Clipboard) -> TierOutcome {
    match clipboard.write_text(url) {
        Ok(()) => TierOutcome::Success(url.len()),
        Err(e) => {
            warn!("Copying url as text failed: {e:?}");
            TierOutcome::Fail
        }
    }
}

pub async fn copy_image(url: &str, fetcher: &dyn Fetch, clipboard: &dyn Clipboard) -> CopyOutcome {
    if let TierOutcome::Success(bytes) = try_image_copy(url, fetcher, clipboard).await {
        return image_copied(CopyTier::Image, bytes);
    }
    if let TierOutcome::Success(bytes) = try_raster_copy(url, fetcher, clipboard).await {
        return image_copied(CopyTier::Raster, bytes);
    }
    match try_text_copy(url, clipboard) {
        TierOutcome::Success(_) => {
            info!("Copied url instead of image: {url}");
            CopyOutcome::UrlCopied
        }
        TierOutcome::Fallback | TierOutcome::Fail => CopyOutcome::Failed,
    }
}

fn image_copied(via: CopyTier, bytes: usize) -> CopyOutcome {
    info!("Copied image to clipboard via {via:?} ({bytes} bytes)");
    CopyOutcome::ImageCopied { via, bytes }
}
