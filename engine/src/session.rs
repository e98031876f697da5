//! Generation lifecycle of one session.
//!
//! [`SessionState`] is a plain value. Every transition takes it by value and
//! hands back the successor.
//!
//! ```text
//! Idle ──begin──▶ Loading ──settle──▶ Settled ──begin──▶ Loading ...
//! ```

use color_eyre::Result;
use log::{debug, error, info, warn};

use crate::image_model::{GenerationRequest, GenerationResponse, ImageModel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Settled,
}

/// Ordered image urls of the last request, in the order the remote returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult(Vec<String>);

impl GenerationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn urls(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_response(response: GenerationResponse, count: usize) -> Option<Self> {
        let images = response.images?;
        if images.len() > count {
            debug!(
                "Remote returned {} images for {count} requested, dropping the rest",
                images.len()
            );
        }
        Some(Self(
            images.into_iter().take(count).map(|img| img.url).collect(),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub prompt: String,
    pub phase: Phase,
    pub has_attempted: bool,
    pub images: GenerationResult,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit_prompt(self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self
        }
    }

    /// Whether the submit control may be invoked.
    pub fn can_generate(&self) -> bool {
        self.phase != Phase::Loading
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Starts a request for `count` images. Blank prompts, a zero count and
    /// requests while another one is in flight leave the state untouched and
    /// return `None`.
    pub fn begin(self, count: usize) -> (Self, Option<GenerationRequest>) {
        if count == 0 {
            warn!("Refusing to request zero images");
            return (self, None);
        }
        if self.prompt.trim().is_empty() || !self.can_generate() {
            return (self, None);
        }

        let request = GenerationRequest {
            prompt: self.prompt.clone(),
            count,
        };
        let state = Self {
            phase: Phase::Loading,
            has_attempted: true,
            images: GenerationResult::empty(),
            ..self
        };
        (state, Some(request))
    }

    /// Records the outcome of `request`. Failures end up as an empty result.
    pub fn settle(
        self,
        request: &GenerationRequest,
        outcome: Result<GenerationResponse>,
    ) -> Self {
        let images = match outcome {
            Ok(response) => match GenerationResult::from_response(response, request.count) {
                Some(images) => {
                    info!("Image URLs received: {:?}", images.urls());
                    images
                }
                None => {
                    error!("No images in response for prompt {:?}", request.prompt);
                    GenerationResult::empty()
                }
            },
            Err(e) => {
                error!("Error generating images: {e:?}");
                GenerationResult::empty()
            }
        };

        Self {
            phase: Phase::Settled,
            has_attempted: true,
            images,
            ..self
        }
    }
}

/// Runs a whole request cycle against `model`.
pub async fn generate(
    state: SessionState,
    model: &(dyn ImageModel + Sync),
    count: usize,
) -> SessionState {
    let (state, request) = state.begin(count);
    let Some(request) = request else {
        return state;
    };
    let outcome = model.generate(&request).await;
    state.settle(&request, outcome)
}

#[cfg(test)]
mod test {
    use std::{
        pin::Pin,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use color_eyre::eyre::eyre;

    use super::*;
    use crate::image_model::{ImageDescriptor, Model};

    #[derive(Clone)]
    enum Reply {
        Images(Vec<&'static str>),
        NoImagesField,
        NetworkError,
    }

    #[derive(Clone)]
    struct FakeModel {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    impl FakeModel {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Arc::default(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ImageModel for FakeModel {
        fn generate<'a>(
            &'a self,
            _request: &'a GenerationRequest,
        ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match &self.reply {
                    Reply::Images(urls) => Ok(GenerationResponse {
                        images: Some(urls.iter().map(|u| ImageDescriptor::new(*u)).collect()),
                        seed: None,
                    }),
                    Reply::NoImagesField => Ok(GenerationResponse::default()),
                    Reply::NetworkError => Err(eyre!("connection refused")),
                }
            })
        }

        fn clone(&self) -> Box<dyn ImageModel + Send + Sync + 'static> {
            Box::new(Clone::clone(self))
        }

        fn model(&self) -> Model {
            Model::FastSdxl
        }
    }

    fn urls(n: usize) -> Vec<&'static str> {
        [
            "https://fal.media/1.png",
            "https://fal.media/2.png",
            "https://fal.media/3.png",
            "https://fal.media/4.png",
        ][..n]
            .to_vec()
    }

    fn request(prompt: &str, count: usize) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.into(),
            count,
        }
    }

    #[test]
    fn blank_prompts_change_nothing() {
        for prompt in ["", " ", "\t\n", "   \r\n  "] {
            let state = SessionState::new().edit_prompt(prompt);
            let (after, request) = state.clone().begin(4);
            assert_eq!(after, state);
            assert!(request.is_none());
        }
    }

    #[test]
    fn begin_enters_loading() {
        let (state, started) = SessionState::new().edit_prompt("a red fox in snow").begin(4);
        assert_eq!(state.phase, Phase::Loading);
        assert!(state.has_attempted);
        assert!(!state.can_generate());
        assert_eq!(started, Some(request("a red fox in snow", 4)));
    }

    #[test]
    fn zero_count_is_refused() {
        let state = SessionState::new().edit_prompt("a red fox in snow");
        let (after, request) = state.clone().begin(0);
        assert_eq!(after, state);
        assert_eq!(after.phase, Phase::Idle);
        assert!(request.is_none());
    }

    #[tokio::test]
    async fn zero_count_makes_no_remote_call() {
        let model = FakeModel::new(Reply::Images(urls(4)));
        let state = generate(SessionState::new().edit_prompt("a red fox in snow"), &model, 0).await;
        assert_eq!(model.calls(), 0);
        assert!(!state.has_attempted);
    }

    #[test]
    fn begin_is_rejected_while_loading() {
        let (loading, first) = SessionState::new().edit_prompt("a cat").begin(4);
        assert!(first.is_some());

        let (again, second) = loading.clone().edit_prompt("a dog").begin(4);
        assert!(second.is_none());
        assert_eq!(again.phase, Phase::Loading);
        assert_eq!(again.prompt, "a dog");
    }

    #[test]
    fn begin_clears_previous_images() {
        let settled = SessionState::new().edit_prompt("a cat").begin(4).0.settle(
            &request("a red fox in snow", 4),
            Ok(GenerationResponse {
                images: Some(vec![ImageDescriptor::new("https://fal.media/old.png")]),
                seed: None,
            }),
        );
        assert_eq!(settled.images.len(), 1);

        let (loading, _) = settled.begin(4);
        assert!(loading.images.is_empty());
    }

    #[test]
    fn settle_preserves_count_and_order() {
        for n in 0..=4 {
            let response = GenerationResponse {
                images: Some(urls(n).into_iter().map(ImageDescriptor::new).collect()),
                seed: Some(1),
            };
            let state = SessionState::new()
                .edit_prompt("a red fox in snow")
                .begin(4)
                .0
                .settle(&request("a red fox in snow", 4), Ok(response));

            assert_eq!(state.phase, Phase::Settled);
            assert_eq!(state.images.urls(), urls(n).as_slice());
        }
    }

    #[test]
    fn settle_drops_surplus_images() {
        let response = GenerationResponse {
            images: Some(urls(4).into_iter().map(ImageDescriptor::new).collect()),
            seed: None,
        };
        let state = SessionState::new()
            .edit_prompt("x")
            .begin(2)
            .0
            .settle(&request("a red fox in snow", 2), Ok(response));
        assert_eq!(state.images.urls(), &urls(4)[..2]);
    }

    #[test]
    fn failures_settle_empty() {
        for outcome in [Ok(GenerationResponse::default()), Err(eyre!("boom"))] {
            let state = SessionState::new()
                .edit_prompt("x")
                .begin(4)
                .0
                .settle(&request("a red fox in snow", 4), outcome);
            assert_eq!(state.phase, Phase::Settled);
            assert!(state.has_attempted);
            assert!(state.images.is_empty());
        }
    }

    #[tokio::test]
    async fn red_fox_end_to_end() {
        let model = FakeModel::new(Reply::Images(urls(4)));
        let state = generate(
            SessionState::new().edit_prompt("a red fox in snow"),
            &model,
            4,
        )
        .await;

        assert_eq!(model.calls(), 1);
        assert_eq!(state.phase, Phase::Settled);
        assert_eq!(state.images.urls(), urls(4).as_slice());
        assert_eq!(state.images.get(3), Some("https://fal.media/4.png"));
        assert_eq!(state.images.get(4), None);
    }

    #[tokio::test]
    async fn empty_prompt_makes_no_remote_call() {
        let model = FakeModel::new(Reply::Images(urls(4)));
        let state = generate(SessionState::new(), &model, 4).await;

        assert_eq!(model.calls(), 0);
        assert_eq!(state, SessionState::new());
        assert!(!state.has_attempted);
    }

    #[tokio::test]
    async fn network_error_settles_with_placeholders() {
        let model = FakeModel::new(Reply::NetworkError);
        let state = generate(SessionState::new().edit_prompt("a red fox in snow"), &model, 4).await;

        assert_eq!(model.calls(), 1);
        assert_eq!(state.phase, Phase::Settled);
        assert!(state.images.is_empty());
        assert!((0..4).all(|i| state.images.get(i).is_none()));
    }

    #[tokio::test]
    async fn missing_images_field_settles_empty() {
        let model = FakeModel::new(Reply::NoImagesField);
        let state = generate(SessionState::new().edit_prompt("x"), &model, 4).await;
        assert_eq!(state.phase, Phase::Settled);
        assert!(state.images.is_empty());
    }

    #[tokio::test]
    async fn new_request_replaces_old_result() {
        let first = FakeModel::new(Reply::Images(urls(4)));
        let second = FakeModel::new(Reply::Images(vec!["https://fal.media/new.png"]));

        let state = generate(SessionState::new().edit_prompt("x"), &first, 4).await;
        let state = generate(state, &second, 4).await;
        assert_eq!(state.images.urls(), ["https://fal.media/new.png"]);
    }
}
