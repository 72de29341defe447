mod cli;

use tracing_subscriber::prelude::*;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    init_tracing(command_line_interface.verbosity());
    command_line_interface.run()
}

/// Logs go to stderr; stdout carries the generated output.
fn init_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "emmyrc_doc=warn",
        1 => "emmyrc_doc=info",
        _ => "emmyrc_doc=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
