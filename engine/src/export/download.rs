use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::WrapErr as _};
use log::{error, info};

use super::{Blob, Fetch};

/// File name offered for the image at `index`; numbering starts at 1.
pub fn file_name(index: usize) -> String {
    format!("generated-image-{}.png", index + 1)
}

pub trait SaveTarget: Send + Sync {
    /// Stores `blob` under `file_name` and returns where it ended up.
    fn save(&self, file_name: &str, blob: &Blob) -> Result<PathBuf>;
}

/// Saves into a directory. Files are written to a temp file first and moved
/// into place, so a half written image never carries the final name.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, file_name: &str, blob: &Blob) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("creating {}", self.dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&blob.bytes)?;
        tmp.flush()?;

        let path = self.dir.join(file_name);
        tmp.persist(&path)
            .wrap_err_with(|| format!("saving {}", path.display()))?;
        Ok(path)
    }
}

/// Fetches the image behind `url` and saves it as the `index`th generated image.
/// The bytes are stored as fetched, even if they are not PNG.
pub async fn download(
    url: &str,
    index: usize,
    fetcher: &dyn Fetch,
    target: &dyn SaveTarget,
) -> Result<PathBuf> {
    let result = async {
        let blob = fetcher.fetch(url).await?;
        target.save(&file_name(index), &blob)
    }
    .await;

    match &result {
        Ok(path) => info!("Saved {url} to {}", path.display()),
        Err(e) => error!("Error downloading image: {e:?}"),
    }
    result
}

#[cfg(test)]
mod test {
    use image::ImageFormat;

    use super::*;
    use crate::export::{
        PNG_MIME,
        test_support::{FakeFetcher, encoded_image},
    };

    const URL: &str = "https://fal.media/files/3.png";

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn names_are_one_based() {
        let names: Vec<_> = (0..4).map(file_name).collect();
        assert_eq!(
            names,
            [
                "generated-image-1.png",
                "generated-image-2.png",
                "generated-image-3.png",
                "generated-image-4.png"
            ]
        );
    }

    #[tokio::test]
    async fn saves_fetched_bytes_under_the_index_name() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encoded_image(3, 3, ImageFormat::Png);
        let fetcher = FakeFetcher::with(URL, Blob::new(PNG_MIME, bytes.clone()));
        let target = DirectoryTarget::new(dir.path());

        let path = download(URL, 2, &fetcher, &target).await.unwrap();

        assert_eq!(path, dir.path().join("generated-image-3.png"));
        assert_eq!(fs::read(&path).unwrap(), bytes);
        assert_eq!(entries(dir.path()), ["generated-image-3.png"]);
    }

    #[tokio::test]
    async fn keeps_non_png_payloads_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encoded_image(3, 3, ImageFormat::Jpeg);
        let fetcher = FakeFetcher::with(URL, Blob::new("image/jpeg", bytes.clone()));

        let path = download(URL, 0, &fetcher, &DirectoryTarget::new(dir.path()))
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "generated-image-1.png");
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default();

        let result = download(URL, 0, &fetcher, &DirectoryTarget::new(dir.path())).await;

        assert!(result.is_err());
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn repeated_download_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path());

        let first = FakeFetcher::with(URL, Blob::new(PNG_MIME, b"first".to_vec()));
        download(URL, 0, &first, &target).await.unwrap();
        let second = FakeFetcher::with(URL, Blob::new(PNG_MIME, b"second".to_vec()));
        let path = download(URL, 0, &second, &target).await.unwrap();

        assert_eq!(fs::read(path).unwrap(), b"second");
        assert_eq!(entries(dir.path()), ["generated-image-1.png"]);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let target = DirectoryTarget::new(&nested);

        let path = target
            .save("generated-image-1.png", &Blob::new(PNG_MIME, b"x".to_vec()))
            .unwrap();

        assert_eq!(path, nested.join("generated-image-1.png"));
        assert_eq!(target.dir(), nested);
    }
}
