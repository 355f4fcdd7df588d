mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;

use greenwall::{ProcessExecutor, UreqTransport};

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new()
        .with_level(cli.log_level.to_level_filter())
        .init()
        .context("failed to initialise logging")?;

    let config = cli.to_config();
    let plan = greenwall::plan(&config).context("failed to lay out the message")?;

    if cli.dry_run {
        println!("{}", plan.preview);
        println!();
        println!(
            "{} cells, {} commits, week 0 starts on Sunday {}",
            plan.specs.len(),
            plan.commits(),
            plan.reference
        );
        for spec in &plan.specs {
            println!("{:>3} {} {}", spec.coordinate.week, spec.coordinate.day, spec.date);
        }
        return Ok(());
    }

    let summary = greenwall::execute(
        &config,
        &plan,
        ProcessExecutor::new(config.command_timeout),
        UreqTransport::new(config.http_timeout),
    )
    .with_context(|| format!("failed to paint history in {}", config.workdir.display()))?;

    info!(
        "done: {} commits{}",
        summary.commits,
        if summary.pushed { ", pushed" } else { "" }
    );
    Ok(())
}
