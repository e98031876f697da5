use derive_more::{From, TryInto};

#[derive(Debug, Clone, From, TryInto)]
pub enum Message {
    Home(ui_messages::Home),
    OptionsMenu(ui_messages::OptionsMenu),
    MessageDialog(ui_messages::MessageDialog),
}

pub mod ui_messages {
    use std::path::PathBuf;

    use engine::{
        export::CopyOutcome,
        image_model::{GenerationRequest, GenerationResponse, Model},
    };
    use iced::widget::{image, text_editor};

    use crate::StringError;

    #[derive(Debug, Clone)]
    pub enum Home {
        PromptChanged(String),
        Generate,
        GenerationFinished(GenerationRequest, Result<GenerationResponse, StringError>),
        PreviewLoaded {
            index: usize,
            url: String,
            result: Result<image::Handle, StringError>,
        },
        CopyPressed(usize),
        CopyFinished(CopyOutcome),
        DownloadPressed(usize),
        DownloadFinished(Result<PathBuf, StringError>),
        ShowInfo,
        OpenOptions,
    }

    #[derive(Debug, Clone)]
    pub enum OptionsMenu {
        FalKeyChanged(String),
        SelectModel(Model),
        ImageCountChanged(String),
        DownloadDirChanged(String),
        Ok,
        Cancel,
    }

    #[derive(Debug, Clone)]
    pub enum MessageDialog {
        Confirm,
        EditAction(text_editor::Action),
    }
}
