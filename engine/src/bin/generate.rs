use std::path::PathBuf;

use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use engine::{
    DEFAULT_IMAGE_COUNT,
    export::{self, DirectoryTarget, HttpFetcher, SystemClipboard},
    image_model::Model,
    parse_image_count,
    session::{self, SessionState},
};

/// Generates images from a prompt without the GUI.
#[derive(clap::Parser)]
struct Args {
    #[arg(long, value_enum, default_value_t)]
    model: Model,
    /// Falls back to $FAL_KEY
    #[arg(long)]
    key: Option<String>,
    #[arg(long, default_value_t = DEFAULT_IMAGE_COUNT, value_parser = parse_image_count)]
    count: usize,
    /// Download every image into this directory
    #[arg(long)]
    out: Option<PathBuf>,
    /// Put the image with this (zero based) index on the clipboard
    #[arg(long)]
    copy: Option<usize>,
    prompt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    let args = Args::parse();
    let key = args.key.or_else(|| std::env::var("FAL_KEY").ok());
    let model = args.model.make(key);

    let state = SessionState::new().edit_prompt(args.prompt);
    let state = session::generate(state, &*model, args.count).await;
    if !state.has_attempted {
        return Err(eyre!("Prompt is empty"));
    }
    if state.images.is_empty() {
        return Err(eyre!("No images were generated"));
    }
    for (i, url) in state.images.urls().iter().enumerate() {
        println!("{}: {url}", i + 1);
    }

    let fetcher = HttpFetcher::new();
    if let Some(dir) = args.out {
        let target = DirectoryTarget::new(dir);
        for (i, url) in state.images.urls().iter().enumerate() {
            let path = export::download(url, i, &fetcher, &target).await?;
            println!("Saved {}", path.display());
        }
    }

    if let Some(index) = args.copy {
        let url = state
            .images
            .get(index)
            .ok_or_else(|| eyre!("There is no image {index}"))?;
        let outcome = export::copy_image(url, &fetcher, &SystemClipboard).await;
        println!("{}", outcome.message());
    }

    Ok(())
}
