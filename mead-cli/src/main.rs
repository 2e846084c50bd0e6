mod cli;
mod commands;
mod error;

use crate::{
    cli::{Args, Commands},
    error::Result,
};
use clap::Parser;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    // Credentials may live in a local .env during development.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    match args.command {
        Commands::Run {
            folder,
            profile,
            metadata_file,
            completed,
            excluded,
            community,
            production,
            endpoint,
            bucket,
            doi_prefix,
        } => {
            commands::run_pipeline(
                folder,
                profile,
                metadata_file,
                completed,
                excluded,
                community,
                production,
                endpoint,
                bucket,
                doi_prefix,
            )
            .await?;
        }

        Commands::Write {
            json_file,
            fnames,
            schema,
            production,
        } => {
            commands::write_record(json_file, fnames, schema, production).await?;
        }

        Commands::Edit {
            record_id,
            json_file,
            doi,
            production,
        } => {
            commands::edit_record(record_id, json_file, doi, production).await?;
        }

        Commands::Download {
            dois,
            fname,
            media_type,
        } => {
            commands::download(dois, fname, media_type).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}
