use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use json2vars::app;
use json2vars::cli::Args;
use json2vars::config;
use json2vars::logging::init_logging;
use json2vars::version::fetcher::VersionFetcher;
use json2vars::version::sources::GitHubTagSource;

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match init_logging(args.verbose, args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let invocation = args
        .into_invocation(config::github_output_path())
        .context("invalid arguments")?;

    let source = GitHubTagSource::from_env().context("failed to build the GitHub client")?;
    let fetcher = VersionFetcher::new(Arc::new(source));

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(app::run(&invocation, &fetcher))
        .with_context(|| format!("failed to process {:?}", invocation.json_file))?;

    Ok(())
}
