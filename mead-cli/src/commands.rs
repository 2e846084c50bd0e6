use std::path::PathBuf;

use datacite::{
    DataCiteClient, DoiRegistry, MediaOptions, MediaOutcome, ProfileKind, RegistryCredentials,
    download_media,
};
use indicatif::{ProgressBar, ProgressStyle};
use ingest_common::{Document, Ledger};
use invenio::{InvenioClient, Repository, WriteOptions, parse_record_url};
use mead_engine::config::MEAD_COMMUNITY;
use mead_engine::{IngestConfig, IngestEngine};
use osn::OsnClient;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::error::{AppError, Result};

/// Registry account the MEAD DOIs are minted under.
const REGISTRY_USERNAME: &str = "CALTECH.HTE";

fn require_env(var: &'static str) -> Result<String> {
    std::env::var(var).map_err(|_| AppError::MissingCredential { var })
}

fn read_document(path: &PathBuf) -> Result<Document> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(AppError::InvalidInput(format!(
            "{} is not a JSON object",
            path.display()
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn run_pipeline(
    folder: String,
    profile: ProfileKind,
    metadata_file: String,
    completed: PathBuf,
    excluded: PathBuf,
    community: Option<String>,
    production: bool,
    endpoint: String,
    bucket: String,
    doi_prefix: String,
) -> Result<()> {
    let token = require_env("RDMTOK")?;
    let password = require_env("DATACITE")?;

    // HTE records are filed under the MEAD community unless overridden.
    let community = community
        .or_else(|| matches!(profile, ProfileKind::Hte).then(|| MEAD_COMMUNITY.to_string()));

    let config = IngestConfig {
        endpoint,
        bucket,
        folder,
        doi_prefix,
        metadata_file,
        community,
        production,
        profile,
        ..IngestConfig::default()
    };

    let store = OsnClient::new(Url::parse(&config.endpoint)?);
    let repo = InvenioClient::new(token);
    let registry = DataCiteClient::new(RegistryCredentials {
        username: REGISTRY_USERNAME.to_string(),
        password,
        prefix: config.doi_prefix.clone(),
    })?;
    let mut ledger = Ledger::load(completed, excluded)?;

    let engine = IngestEngine::new(&store, &repo, &registry, config)?;
    let summary = engine.run(&mut ledger).await?;
    info!(
        completed = summary.completed,
        excluded = summary.excluded,
        "ingestion run finished"
    );
    println!(
        "{} record(s) completed, {} excluded",
        summary.completed, summary.excluded
    );
    Ok(())
}

pub async fn write_record(
    json_file: PathBuf,
    fnames: Vec<String>,
    schema: String,
    production: bool,
) -> Result<()> {
    let token = require_env("RDMTOK")?;
    let metadata = read_document(&json_file)?;
    let options = WriteOptions {
        production,
        schema,
        publish: true,
        community: None,
    };

    let client = InvenioClient::new(token);
    let record_id = client.write(&metadata, &fnames, &options).await?;
    println!("{record_id}");
    Ok(())
}

pub async fn edit_record(
    record_id: String,
    json_file: PathBuf,
    doi: Option<String>,
    production: bool,
) -> Result<()> {
    let token = require_env("RDMTOK")?;
    let metadata = read_document(&json_file)?;
    let options = WriteOptions {
        production,
        ..WriteOptions::default()
    };

    let client = InvenioClient::new(token);
    let confirmation = client.edit(&record_id, &metadata, &options).await?;
    println!("{confirmation}");

    if let Some(doi) = doi {
        let password = require_env("DATACITE")?;
        let prefix = doi.split('/').next().unwrap_or_default().to_string();
        let registry = DataCiteClient::new(RegistryCredentials {
            username: REGISTRY_USERNAME.to_string(),
            password,
            prefix,
        })?;
        let url = parse_record_url(&confirmation)?;
        let registered = registry.update_doi(&doi, &metadata, &url).await?;
        println!("{registered}");
    }
    Ok(())
}

pub async fn download(
    dois: Vec<String>,
    fname: Option<PathBuf>,
    media_type: Option<String>,
) -> Result<()> {
    let http = reqwest::Client::new();
    let options = MediaOptions { fname, media_type };

    for doi in &dois {
        let bar = ProgressBar::new(0).with_style(ProgressStyle::default_bar());
        let outcome = download_media(&http, doi, &options, |received, total| {
            if bar.length() != Some(total) {
                bar.set_length(total);
            }
            bar.set_position(received);
        })
        .await?;
        bar.finish_and_clear();

        match outcome {
            MediaOutcome::Saved { path, bytes } => {
                println!("{doi}: saved {} ({bytes} bytes)", path.display());
            }
            MediaOutcome::Unavailable => println!("{doi}: File Unavailable"),
            MediaOutcome::MissingContentLength => println!("{doi}: Did not get file"),
        }
    }
    Ok(())
}
