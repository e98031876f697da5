use std::path::PathBuf;

use engine::{image_model::Model, parse_image_count};

/// Every flag takes precedence over the config file and $FAL_KEY.
#[derive(Debug, Clone, Default, clap::Parser)]
pub struct Cli {
    #[arg(long)]
    pub fal_key: Option<String>,

    #[arg(long, value_enum)]
    pub model: Option<Model>,

    /// Images per generation
    #[arg(long, value_parser = parse_image_count)]
    pub count: Option<usize>,

    /// Where downloaded images are saved
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}
