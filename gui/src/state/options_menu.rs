use std::path::PathBuf;

use color_eyre::{Result, eyre::eyre};
use iced::{
    Length,
    widget::{button, column, radio, row, space, text, text_input},
};
use strum::IntoEnumIterator;

use crate::{
    TryIntoExt, bold_text,
    context::{Config, Context},
    elem_list,
    message::{Message, ui_messages::OptionsMenu as MyMessage},
    save_config,
    state::{State, StateCommand, cmd, forward},
    top_level_container,
};
use engine::{image_model::Model, parse_image_count};

/// Edits the config file. Values given on the command line or through
/// $FAL_KEY still win after saving.
#[derive(Debug)]
pub struct OptionsMenu {
    parent: Box<dyn State>,
    fal_key: String,
    model: Model,
    image_count: String,
    download_dir: String,
}

impl OptionsMenu {
    pub fn new(parent: Box<dyn State>, config: &Config) -> Self {
        Self {
            parent,
            fal_key: config.fal_key.clone().unwrap_or_default(),
            model: config.model,
            image_count: config.image_count.to_string(),
            download_dir: config
                .download_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    fn draft(&self) -> Result<Config> {
        let image_count = parse_image_count(&self.image_count)
            .map_err(|e| eyre!("Images per generation: {e}"))?;
        let non_blank = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Config {
            fal_key: non_blank(&self.fal_key),
            model: self.model,
            image_count,
            download_dir: non_blank(&self.download_dir).map(PathBuf::from),
        })
    }
}

impl State for OptionsMenu {
    fn update(&mut self, event: Message, ctx: &mut Context) -> Result<StateCommand> {
        if !matches!(event, Message::OptionsMenu(_)) {
            return forward(&mut self.parent, event, ctx);
        }

        use MyMessage::*;
        match event.try_into_ex()? {
            FalKeyChanged(val) => {
                self.fal_key = val;
                cmd::none()
            }
            SelectModel(model) => {
                self.model = model;
                cmd::none()
            }
            ImageCountChanged(val) => {
                self.image_count = val;
                cmd::none()
            }
            DownloadDirChanged(val) => {
                self.download_dir = val;
                cmd::none()
            }
            Ok => {
                let config = self.draft()?;
                save_config(&config)?;
                ctx.set_config(config);
                cmd::transition(self.parent.clone())
            }
            Cancel => cmd::transition(self.parent.clone()),
        }
    }

    fn view<'a>(&'a self, ctx: &'a Context) -> iced::Element<'a, Message> {
        let download_hint = ctx.config.download_dir().display().to_string();
        let items = elem_list![
            bold_text("Settings").width(Length::Fill).center(),
            space().height(20),
            text("fal.ai API Key"),
            text_input("key", &self.fal_key)
                .on_input(|s| MyMessage::FalKeyChanged(s).into())
                .secure(true)
                .width(Length::Fill),
            space().height(20),
            text("Image Model"),
            column(Model::iter().map(|m| {
                radio(format!("{m} ({})", m.fal_id()), m, Some(self.model), |m| {
                    MyMessage::SelectModel(m).into()
                })
                .into()
            }))
            .spacing(10),
            space().height(20),
            text("Images per generation"),
            text_input("4", &self.image_count)
                .on_input(|s| MyMessage::ImageCountChanged(s).into())
                .width(Length::Fill),
            space().height(20),
            text("Download directory"),
            text_input(&download_hint, &self.download_dir)
                .on_input(|s| MyMessage::DownloadDirChanged(s).into())
                .width(Length::Fill),
            space().height(30),
            row![
                button("Cancel").on_press(MyMessage::Cancel.into()),
                button("Save").on_press(MyMessage::Ok.into()),
            ]
            .spacing(10),
        ];

        top_level_container(column(items).spacing(12).width(Length::Fill)).into()
    }

    fn clone(&self) -> Box<dyn State> {
        Box::new(Self {
            parent: self.parent.clone(),
            fal_key: self.fal_key.clone(),
            model: self.model,
            image_count: self.image_count.clone(),
            download_dir: self.download_dir.clone(),
        })
    }
}
