use std::process::ExitCode;

use clap::Parser;

use simdock::cli::Cli;
use simdock::color::set_color_mode;
use simdock::commands;

#[cfg(feature = "trace")]
fn init_trace() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("SIMDOCK_TRACE")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    #[cfg(feature = "trace")]
    init_trace();
    let cli = Cli::parse();
    if let Some(mode) = cli.color {
        set_color_mode(mode);
    }
    commands::run(&cli)
}
