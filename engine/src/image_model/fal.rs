use std::pin::Pin;

use color_eyre::{Result, eyre::bail};
use log::{debug, info};
use tokio::pin;
use tokio_stream::{Stream, StreamExt};

use crate::image_model::{GenerationRequest, GenerationResponse, ImageModel, Model};

pub mod fal_api;
pub use fal_api::FalApiError;

#[derive(Clone)]
pub struct FalModel {
    model: Model,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl FalModel {
    pub fn new(model: Model, api_key: Option<String>) -> Self {
        Self {
            model,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Follows the queue events until the result arrives.
async fn wait_for_result(
    stream: impl Stream<Item = Result<fal_api::QueueEvent>>,
) -> Result<GenerationResponse> {
    pin!(stream);
    while let Some(event) = stream.try_next().await? {
        match event {
            fal_api::QueueEvent::Queued { position } => {
                debug!("In queue, position: {position:?}");
            }
            fal_api::QueueEvent::Log(line) => info!("{line}"),
            fal_api::QueueEvent::Completed(response) => {
                debug!("Full API response: {response:#?}");
                return Ok(response);
            }
        }
    }

    bail!("fal queue closed without delivering a result")
}

impl ImageModel for FalModel {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
        Box::pin(async move {
            let Some(api_key) = self.api_key.clone() else {
                return Err(FalApiError::MissingCredentials.into());
            };

            info!(
                "Starting generation of {} image(s) with {}: {:?}",
                request.count, self.model, request.prompt
            );
            let body = fal_api::RequestBody {
                prompt: request.prompt.clone(),
                num_images: request.count,
            };
            let stream = fal_api::subscribe(
                self.model.fal_id().to_string(),
                body,
                api_key,
                self.client.clone(),
            );

            wait_for_result(stream).await
        })
    }

    fn clone(&self) -> Box<dyn ImageModel + Send + Sync + 'static> {
        Box::new(Clone::clone(self))
    }

    fn model(&self) -> Model {
        self.model
    }
}
