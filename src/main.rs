// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::CookArgs;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging; RUST_LOG wins over -v/-q
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::List => commands::cmd_list(),
        Commands::Show { target, json } => commands::cmd_show(config, &target, json),
        Commands::Validate { recipe } => commands::cmd_validate(&recipe),
        Commands::Generate { target, dest } => commands::cmd_generate(config, &target, &dest),
        Commands::Fetch {
            recipe,
            pkg_version,
            all_versions,
            source_cache,
        } => commands::cmd_fetch(
            config,
            &recipe,
            pkg_version.as_deref(),
            all_versions,
            source_cache,
        ),
        Commands::Cook {
            target,
            output,
            source_cache,
            jobs,
            cmake,
            generator,
            prefixes,
            allow_system_deps,
            keep_builddir,
            validate_only,
            fetch_only,
            progress,
        } => commands::cmd_cook(
            config,
            &target,
            CookArgs {
                output,
                source_cache,
                jobs,
                cmake,
                generator,
                prefixes,
                allow_system_deps,
                keep_builddir,
                validate_only,
                fetch_only,
                progress,
            },
        ),
    }
}

/// Build tool failures exit with the tool's own status, everything else with 1
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<larder::Error>())
        .map(larder::Error::exit_code)
        .unwrap_or(1)
}
