use anyhow::Context;
use clap::Parser;

use bigfiles::app::App;
use bigfiles::cli::{Cli, Config};
use bigfiles::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    let config = Config::from_cli(cli).context("failed to build configuration")?;

    let mut app = App::new(config);
    let engine = app.engine();
    ctrlc::set_handler(move || engine.stop()).context("failed to install Ctrl-C handler")?;

    app.run().context("scan failed")?;

    Ok(())
}
