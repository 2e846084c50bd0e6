//! DataCite media API download helper.
//!
//! Queries `GET /dois/{doi}/media`, selects an entry, and streams the
//! binary to a local file named after the DOI (slashes replaced with
//! hyphens) unless overridden. An unavailable file (HTTP 403) and a
//! response without a content length are distinct non-fatal outcomes,
//! reported to the caller instead of written to disk.

use std::path::PathBuf;

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::API_BASE;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("no media entries listed for {doi}")]
    NoMedia { doi: String },

    #[error("no media entry of type `{media_type}` for {doi}")]
    NoMatch { doi: String, media_type: String },
}

#[derive(Debug, Clone, Default)]
pub struct MediaOptions {
    /// Target file name; defaults to the DOI with `/` replaced by `-`.
    pub fname: Option<PathBuf>,
    /// Restrict selection to a specific media type.
    pub media_type: Option<String>,
}

/// How one media download resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    Saved { path: PathBuf, bytes: u64 },
    /// The media endpoint answered HTTP 403.
    Unavailable,
    /// The response carried no content length, so nothing was written.
    MissingContentLength,
}

#[derive(Debug, Deserialize)]
struct MediaIndex {
    data: Vec<MediaEntry>,
}

#[derive(Debug, Deserialize)]
struct MediaEntry {
    attributes: MediaAttributes,
}

#[derive(Debug, Deserialize)]
struct MediaAttributes {
    url: String,
    #[serde(rename = "mediaType")]
    media_type: Option<String>,
}

/// Default local file name for a DOI's media content.
pub fn default_file_name(doi: &str) -> String {
    doi.replace('/', "-")
}

fn select_entry<'a>(
    entries: &'a [MediaEntry],
    media_type: Option<&str>,
) -> Option<&'a MediaEntry> {
    match media_type {
        None => entries.first(),
        Some(wanted) => entries
            .iter()
            .find(|entry| entry.attributes.media_type.as_deref() == Some(wanted)),
    }
}

/// Download the media content behind a DOI.
///
/// `progress` is called after every chunk with `(received, total)` bytes.
pub async fn download_media<F>(
    http: &Client,
    doi: &str,
    options: &MediaOptions,
    mut progress: F,
) -> Result<MediaOutcome, MediaError>
where
    F: FnMut(u64, u64),
{
    let index_url = format!("{API_BASE}/dois/{doi}/media");
    let index: MediaIndex = http
        .get(&index_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if index.data.is_empty() {
        return Err(MediaError::NoMedia {
            doi: doi.to_string(),
        });
    }
    let entry = select_entry(&index.data, options.media_type.as_deref()).ok_or_else(|| {
        MediaError::NoMatch {
            doi: doi.to_string(),
            media_type: options.media_type.clone().unwrap_or_default(),
        }
    })?;
    debug!(%doi, url = %entry.attributes.url, "selected media entry");

    let response = http.get(&entry.attributes.url).send().await?;
    if response.status() == StatusCode::FORBIDDEN {
        return Ok(MediaOutcome::Unavailable);
    }
    let Some(total) = response.content_length() else {
        return Ok(MediaOutcome::MissingContentLength);
    };

    let path = options
        .fname
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_file_name(doi)));
    let mut file = tokio::fs::File::create(&path).await?;
    let mut stream = response.bytes_stream();
    let mut received = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        received += chunk.len() as u64;
        progress(received, total);
    }
    file.flush().await?;

    Ok(MediaOutcome::Saved {
        path,
        bytes: received,
    })
}
