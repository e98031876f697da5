use crate::image_model::ImageModel;

pub mod export;
pub mod image_model;
pub mod session;

pub type ImgModBox = Box<dyn ImageModel + Send + Sync>;

/// Number of images requested per generation unless configured otherwise.
pub const DEFAULT_IMAGE_COUNT: usize = 4;

/// Parses an images-per-generation value, which has to be positive.
/// Usable as a clap `value_parser`.
pub fn parse_image_count(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("at least one image has to be requested".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("{s:?} is not a number of images: {e}")),
    }
}
