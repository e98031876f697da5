use color_eyre::Result;
use iced::{Element, Task};
use std::fmt;

mod home;
pub mod modal;
mod options_menu;

pub use home::Home;
pub use modal::{Dialog, Modal};
pub use options_menu::OptionsMenu;

use crate::{context::Context, message::Message};

pub trait State: fmt::Debug {
    fn update(&mut self, event: Message, ctx: &mut Context) -> Result<StateCommand>;
    fn view<'a>(&'a self, ctx: &'a Context) -> Element<'a, Message>;
    fn clone(&self) -> Box<dyn State>;
}

pub trait StateExt: State + Sized + 'static {
    fn boxed(self) -> Box<dyn State> {
        Box::new(self)
    }
}

impl<T: State + Sized + 'static> StateExt for T {}

impl<T: std::ops::DerefMut<Target = dyn State> + fmt::Debug> State for T {
    fn update(&mut self, event: Message, ctx: &mut Context) -> Result<StateCommand> {
        self.deref_mut().update(event, ctx)
    }

    fn view<'a>(&'a self, ctx: &'a Context) -> Element<'a, Message> {
        self.deref().view(ctx)
    }

    fn clone(&self) -> Box<dyn State> {
        self.deref().clone()
    }
}

#[derive(Debug, Default)]
pub struct StateCommand {
    pub task: Option<Task<Message>>,
    pub transition: Option<Box<dyn State>>,
}

/// Hands a message that belongs to a state further down to it. Work started
/// there keeps reporting back while another state is on top.
fn forward(parent: &mut Box<dyn State>, event: Message, ctx: &mut Context) -> Result<StateCommand> {
    let cmd = parent.update(event, ctx)?;
    if let Some(new_parent) = cmd.transition {
        *parent = new_parent;
    }
    Ok(StateCommand {
        task: cmd.task,
        transition: None,
    })
}

pub mod cmd {
    use super::*;

    pub fn none() -> Result<StateCommand> {
        Ok(StateCommand::default())
    }

    pub fn task(t: Task<Message>) -> Result<StateCommand> {
        Ok(StateCommand {
            task: Some(t),
            transition: None,
        })
    }

    pub fn transition(s: impl State + 'static) -> Result<StateCommand> {
        Ok(StateCommand {
            task: None,
            transition: Some(Box::new(s)),
        })
    }

    pub fn transition_with_task(s: impl State + 'static, t: Task<Message>) -> Result<StateCommand> {
        Ok(StateCommand {
            task: Some(t),
            transition: Some(Box::new(s)),
        })
    }
}
