//! Desktop viewer for the spherical photo menu.

#[macro_use]
extern crate lazy_static;

mod app;
mod cli;
mod config;

const TITLE: &str = "Sphere Menu";

fn main() -> eyre::Result<()> {
    use clap::Parser;

    let args = cli::Args::parse();

    // Initialize logging.
    env_logger::builder().init();
    color_eyre::install()?;

    let config = config::load(args.config.as_deref())?;

    if let Some(subcommand) = args.subcommand {
        return cli::exec(subcommand, &config);
    }

    let items = cli::load_items(args.items.as_deref(), &config)?;
    let scale = args.scale.unwrap_or(config.scale);
    log::info!("showing {} items", items.len());

    app::run(config, items, scale)
}
