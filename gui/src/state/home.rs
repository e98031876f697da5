use std::mem;

use color_eyre::{Report, Result, eyre::eyre};
use engine::{
    export::{self, Fetch as _},
    image_model::ImageModel,
    session::SessionState,
};
use iced::{
    Color, ContentFit, Element, Length, Task,
    alignment::Vertical,
    widget::{self, button, column, container, image, row, space, text, text_input},
};
use log::{info, warn};

use crate::{
    StringError, TryIntoExt, bold_text,
    context::Context,
    elem_list, italic_text,
    message::{Message, ui_messages::Home as MyMessage},
    state::{Modal, OptionsMenu, State, StateCommand, cmd},
    top_level_container,
};

const API_INFO: &str = indoc::indoc! {"
    An API (Application Programming Interface) is like a digital waiter in a restaurant:

    • You (the client) make a request, like ordering food
    • The API takes your request to the kitchen (the server)
    • The kitchen processes your order and prepares the response
    • The API delivers the result back to you

    In this app, when you enter a description, we use an AI API to generate images based on your text.
"};

const CELL_HEIGHT: f32 = 250.;

#[derive(Debug, Clone)]
enum Preview {
    Pending,
    Ready(image::Handle),
    Failed,
}

/// The prompt, the generate button and the image grid.
#[derive(Debug, Clone, Default)]
pub struct Home {
    session: SessionState,
    /// Parallel to `session.images`.
    previews: Vec<Preview>,
}

impl Home {
    pub fn new() -> Self {
        Self::default()
    }

    fn image_url(&self, index: usize) -> Result<String> {
        self.session
            .images
            .get(index)
            .map(str::to_string)
            .ok_or_else(|| eyre!("There is no image at position {}", index + 1))
    }

    fn generate(&mut self, ctx: &Context) -> Result<StateCommand> {
        let (session, request) = mem::take(&mut self.session).begin(ctx.image_count());
        self.session = session;
        let Some(request) = request else {
            return cmd::none();
        };
        self.previews.clear();

        let model = ImageModel::clone(&*ctx.image_model);
        cmd::task(Task::perform(
            async move {
                let outcome = model.generate(&request).await;
                (request, outcome)
            },
            |(request, outcome)| {
                MyMessage::GenerationFinished(request, outcome.map_err(StringError::from)).into()
            },
        ))
    }

    fn load_previews(&self, ctx: &Context) -> Task<Message> {
        Task::batch(
            self.session
                .images
                .urls()
                .iter()
                .enumerate()
                .map(|(index, url)| {
                    let fetcher = ctx.fetcher.clone();
                    let url = url.clone();
                    Task::perform(
                        async move {
                            let result = fetcher
                                .fetch(&url)
                                .await
                                .map(|blob| image::Handle::from_bytes(blob.bytes));
                            (url, result)
                        },
                        move |(url, result)| {
                            MyMessage::PreviewLoaded {
                                index,
                                url,
                                result: result.map_err(StringError::from),
                            }
                            .into()
                        },
                    )
                }),
        )
    }

    fn cell(&self, index: usize) -> Element<'_, Message> {
        let content: Element<'_, Message> = if self.session.is_loading() {
            italic_text("Creating your masterpiece...").into()
        } else if self.session.images.get(index).is_some() {
            let picture: Element<'_, Message> = match self.previews.get(index) {
                Some(Preview::Ready(handle)) => widget::image(handle.clone())
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Contain)
                    .into(),
                Some(Preview::Failed) => text("Preview unavailable").into(),
                Some(Preview::Pending) | None => italic_text("Loading image...").into(),
            };
            let actions = container(
                row![
                    button("Copy").on_press(MyMessage::CopyPressed(index).into()),
                    button("Download").on_press(MyMessage::DownloadPressed(index).into()),
                ]
                .spacing(5),
            )
            .align_right(Length::Fill)
            .padding(5);
            widget::hover(picture, actions)
        } else {
            text("Generated image will appear here").into()
        };

        container(content)
            .center(Length::Fill)
            .height(CELL_HEIGHT)
            .style(container::rounded_box)
            .into()
    }

    fn grid(&self, ctx: &Context) -> Element<'_, Message> {
        if !self.session.has_attempted {
            return container(italic_text(
                "Enter a description and click Generate to create images",
            ))
            .center_x(Length::Fill)
            .padding(40)
            .into();
        }

        let cells = ctx.image_count().max(self.session.images.len());
        column((0..cells).step_by(2).map(|i| {
            let right = if i + 1 < cells {
                self.cell(i + 1)
            } else {
                space().width(Length::Fill).into()
            };
            row![self.cell(i), right].spacing(10).into()
        }))
        .spacing(10)
        .into()
    }
}

impl State for Home {
    fn update(&mut self, event: Message, ctx: &mut Context) -> Result<StateCommand> {
        use MyMessage::*;

        match event.try_into_ex()? {
            PromptChanged(prompt) => {
                self.session = mem::take(&mut self.session).edit_prompt(prompt);
                cmd::none()
            }
            Generate => self.generate(ctx),
            GenerationFinished(request, outcome) => {
                if !self.session.is_loading() {
                    warn!("Dropping result for {:?}, nothing is pending", request.prompt);
                    return cmd::none();
                }
                self.session =
                    mem::take(&mut self.session).settle(&request, outcome.map_err(Report::new));
                self.previews = vec![Preview::Pending; self.session.images.len()];
                cmd::task(self.load_previews(ctx))
            }
            PreviewLoaded { index, url, result } => {
                if self.session.images.get(index) != Some(url.as_str()) {
                    return cmd::none();
                }
                if let Some(preview) = self.previews.get_mut(index) {
                    *preview = match result {
                        Ok(handle) => Preview::Ready(handle),
                        Err(e) => {
                            warn!("Couldn't load preview {url}: {e}");
                            Preview::Failed
                        }
                    };
                }
                cmd::none()
            }
            CopyPressed(index) => {
                let url = self.image_url(index)?;
                let fetcher = ctx.fetcher.clone();
                let clipboard = ctx.clipboard.clone();
                cmd::task(Task::perform(
                    async move { export::copy_image(&url, &*fetcher, &*clipboard).await },
                    |outcome| CopyFinished(outcome).into(),
                ))
            }
            CopyFinished(outcome) => cmd::transition(Modal::message(
                State::clone(self),
                "Copy image",
                outcome.message(),
            )),
            DownloadPressed(index) => {
                let url = self.image_url(index)?;
                let fetcher = ctx.fetcher.clone();
                let target = ctx.downloads.clone();
                cmd::task(Task::perform(
                    async move {
                        export::download(&url, index, &*fetcher, &*target)
                            .await
                            .map_err(StringError::from)
                    },
                    |res| DownloadFinished(res).into(),
                ))
            }
            DownloadFinished(Ok(path)) => {
                info!("Image saved to {}", path.display());
                cmd::none()
            }
            DownloadFinished(Err(e)) => cmd::transition(Modal::message(
                State::clone(self),
                "Download failed",
                e.to_string(),
            )),
            ShowInfo => cmd::transition(Modal::message(
                State::clone(self),
                "What is an API?",
                API_INFO,
            )),
            OpenOptions => cmd::transition(OptionsMenu::new(State::clone(self), &ctx.config)),
        }
    }

    fn view<'a>(&'a self, ctx: &'a Context) -> Element<'a, Message> {
        use MyMessage::*;

        let header = container(
            row![
                bold_text("Home").size(20).width(Length::Fill),
                button("Settings").on_press(OpenOptions.into()),
                button("i").on_press(ShowInfo.into()),
            ]
            .spacing(10)
            .align_y(Vertical::Center),
        )
        .padding(8)
        .width(Length::Fill)
        .style(|_| container::Style {
            text_color: Some(Color::WHITE),
            ..container::background(Color::from_rgb8(0x33, 0x41, 0x55))
        });

        let can_generate = self.session.can_generate();
        let mut prompt = text_input("Enter the description of Image", &self.session.prompt)
            .on_input(|s| PromptChanged(s).into())
            .padding(10)
            .width(Length::Fill);
        if can_generate {
            prompt = prompt.on_submit(Generate.into());
        }
        let label = if self.session.is_loading() {
            "Generating..."
        } else {
            "Generate"
        };
        let generate = button(label)
            .padding(10)
            .on_press_maybe(can_generate.then(|| Generate.into()));

        column![
            header,
            top_level_container(column(elem_list![
                row![prompt, generate].spacing(10),
                self.grid(ctx),
            ]).spacing(20))
        ]
        .into()
    }

    fn clone(&self) -> Box<dyn State> {
        Box::new(Clone::clone(self))
    }
}
