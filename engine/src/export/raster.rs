use std::io::Cursor;

use color_eyre::{Result, eyre::WrapErr as _};
use image::{DynamicImage, ImageFormat, RgbaImage};

use super::{Blob, PNG_MIME};

/// Offscreen RGBA surface holding one decoded image at its natural size.
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Decodes `bytes` in whatever format they are. The declared content
    /// type is not consulted.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).wrap_err("decoding image")?;
        Ok(Self {
            pixels: decoded.to_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn encode_png(&self) -> Result<Blob> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.pixels.clone())
            .write_to(&mut out, ImageFormat::Png)
            .wrap_err("encoding png")?;
        Ok(Blob::new(PNG_MIME, out.into_inner()))
    }
}
