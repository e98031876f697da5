use clap::Parser;
use color_eyre::Result;
use prompt_canvas::{Gui, cli::Cli, context::Overrides, load_config};

pub fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let cli = Cli::parse();
    let overrides = Overrides::new(std::env::var("FAL_KEY").ok(), cli);
    let cfg = load_config()?.unwrap_or_default();
    iced::application(
        move || Gui::new(cfg.clone(), overrides.clone()),
        Gui::update,
        Gui::view,
    )
    .run()?;
    Ok(())
}
