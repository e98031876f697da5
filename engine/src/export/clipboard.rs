use std::borrow::Cow;

use color_eyre::{
    Result,
    eyre::{WrapErr as _, ensure},
};
use image::ImageFormat;
use log::debug;

use super::{Blob, PNG_MIME};

pub trait Clipboard: Send + Sync {
    fn write_image(&self, blob: &Blob) -> Result<()>;
    fn write_text(&self, text: &str) -> Result<()>;
}

/// The OS clipboard. Like browser clipboards it only takes PNG images;
/// anything else has to be re-encoded by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_image(&self, blob: &Blob) -> Result<()> {
        ensure!(
            blob.mime == PNG_MIME,
            "Clipboard does not accept {} images",
            blob.mime
        );
        let pixels = image::load_from_memory_with_format(&blob.bytes, ImageFormat::Png)
            .wrap_err("decoding png for the clipboard")?
            .to_rgba8();

        let data = arboard::ImageData {
            width: pixels.width() as usize,
            height: pixels.height() as usize,
            bytes: Cow::Borrowed(pixels.as_raw()),
        };
        arboard::Clipboard::new()?.set_image(data)?;
        debug!("Wrote {}x{} image to clipboard", pixels.width(), pixels.height());
        Ok(())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        arboard::Clipboard::new()?.set_text(text)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::export::test_support::encoded_image;

    #[test]
    fn refuses_non_png_before_touching_the_clipboard() {
        let jpeg = Blob::new("image/jpeg", encoded_image(2, 2, ImageFormat::Jpeg));
        let err = SystemClipboard.write_image(&jpeg).unwrap_err();
        assert!(err.to_string().contains("image/jpeg"));
    }

    #[test]
    fn refuses_mislabelled_png() {
        let blob = Blob::new(PNG_MIME, b"not a png".to_vec());
        assert!(SystemClipboard.write_image(&blob).is_err());
    }
}
