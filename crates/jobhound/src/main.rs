use anyhow::Result;
use clap::Parser;

use jobhound::cli::{run, Cli};
use jobhound_logging::{init_logging, LogConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        app_name: "jobhound",
        verbose: cli.verbose,
        log_dir: None,
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let exit_code = runtime.block_on(run(cli))?;
    std::process::exit(exit_code);
}
