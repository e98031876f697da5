use std::pin::Pin;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub mod fal;
pub use fal::FalModel;

use crate::ImgModBox;

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumIter,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    Default,
)]
pub enum Model {
    #[default]
    #[strum(to_string = "Fast SDXL")]
    FastSdxl,
    #[strum(to_string = "Flux Schnell")]
    FluxSchnell,
    #[strum(to_string = "Flux Dev")]
    FluxDev,
}

impl Model {
    /// The credential may be missing, in which case the first generation fails instead.
    pub fn make(&self, key: Option<String>) -> ImgModBox {
        Box::new(FalModel::new(*self, key))
    }

    pub fn fal_id(&self) -> &'static str {
        match self {
            Model::FastSdxl => "fal-ai/fast-sdxl",
            Model::FluxSchnell => "fal-ai/flux/schnell",
            Model::FluxDev => "fal-ai/flux/dev",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub count: usize,
}

/// Terminal answer of the remote client. `images` is absent when the
/// backend answered without producing any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Option<Vec<ImageDescriptor>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl ImageDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
            content_type: None,
        }
    }
}

pub trait ImageModel {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>>;

    fn clone(&self) -> Box<dyn ImageModel + Send + Sync + 'static>;
    fn model(&self) -> Model;
}
