//! S3 `ListObjectsV2` client over plain anonymous HTTP.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::{ObjectStore, StoreError};

/// Anonymous client for one S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OsnClient {
    http: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<Contents>,
    #[serde(default)]
    common_prefixes: Vec<CommonPrefix>,
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Contents {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommonPrefix {
    prefix: String,
}

impl OsnClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch every page of a listing for `key_prefix` within `bucket`.
    async fn list_pages(
        &self,
        bucket: &str,
        key_prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<(Vec<String>, Vec<String>), StoreError> {
        let mut keys = Vec::new();
        let mut prefixes = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut url = self.endpoint.join(bucket)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("list-type", "2");
                query.append_pair("prefix", key_prefix);
                if let Some(delimiter) = delimiter {
                    query.append_pair("delimiter", delimiter);
                }
                if let Some(token) = &continuation {
                    query.append_pair("continuation-token", token);
                }
            }
            trace!(%url, "listing objects");

            let response = self.http.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(StoreError::http_status(status, format!("{bucket}/{key_prefix}")));
            }
            let body = response.text().await?;
            let page: ListBucketResult = quick_xml::de::from_str(&body)?;

            keys.extend(page.contents.into_iter().map(|c| c.key));
            prefixes.extend(page.common_prefixes.into_iter().map(|p| p.prefix));

            match (page.is_truncated, page.next_continuation_token) {
                (true, Some(token)) => continuation = Some(token),
                _ => break,
            }
        }

        Ok((keys, prefixes))
    }
}

/// Split a `{bucket}/{key}` path into its bucket and key parts.
fn split_bucket_key(path: &str) -> Result<(&str, &str), StoreError> {
    match path.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() => Ok((bucket, key)),
        _ => Err(StoreError::invalid_path(path, "expected `{bucket}/{key}`")),
    }
}

/// Merge listing keys and common prefixes into `{bucket}/...` entries.
///
/// Directory prefixes lose their trailing slash; object keys keep theirs,
/// so a prefix marker object sorts ahead of the entries beneath it.
fn assemble_entries(bucket: &str, keys: Vec<String>, prefixes: Vec<String>) -> Vec<String> {
    let mut entries: Vec<String> = keys
        .into_iter()
        .map(|key| format!("{bucket}/{key}"))
        .chain(
            prefixes
                .into_iter()
                .map(|prefix| format!("{bucket}/{}", prefix.trim_end_matches('/'))),
        )
        .collect();
    entries.sort();
    entries
}

#[async_trait]
impl ObjectStore for OsnClient {
    async fn ls(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let (bucket, key_prefix) = split_bucket_key(path)?;
        let (keys, prefixes) = self.list_pages(bucket, key_prefix, Some("/")).await?;
        let entries = assemble_entries(bucket, keys, prefixes);
        debug!(path, entries = entries.len(), "listed prefix");
        Ok(entries)
    }

    async fn read(&self, path: &str) -> Result<Bytes, StoreError> {
        let url = self.endpoint.join(path)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::http_status(status, path));
        }
        Ok(response.bytes().await?)
    }

    async fn glob_zip(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let (bucket, key_prefix) = split_bucket_key(path)?;
        let (keys, _) = self.list_pages(bucket, key_prefix, None).await?;
        let mut matches: Vec<String> = keys
            .into_iter()
            .filter(|key| key.ends_with(".zip"))
            .map(|key| format!("{bucket}/{key}"))
            .collect();
        matches.sort();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_split_into_bucket_and_key() {
        let (bucket, key) = split_bucket_key("ini210004tommorrell/0_gregoire/").unwrap();
        assert_eq!(bucket, "ini210004tommorrell");
        assert_eq!(key, "0_gregoire/");
        assert!(split_bucket_key("no-separator").is_err());
    }

    #[test]
    fn listing_xml_parses_contents_and_prefixes() {
        let raw = r#"<?xml version="1.0" encoding="UTF-8"?>
            <ListBucketResult>
              <IsTruncated>false</IsTruncated>
              <Contents><Key>0_gregoire/</Key></Contents>
              <CommonPrefixes><Prefix>0_gregoire/abc/</Prefix></CommonPrefixes>
              <CommonPrefixes><Prefix>0_gregoire/def/</Prefix></CommonPrefixes>
            </ListBucketResult>"#;
        let page: ListBucketResult = quick_xml::de::from_str(raw).unwrap();
        assert_eq!(page.contents.len(), 1);
        assert_eq!(page.common_prefixes.len(), 2);
        assert!(!page.is_truncated);
        assert!(page.next_continuation_token.is_none());
    }

    #[test]
    fn truncated_listing_carries_a_token() {
        let raw = r#"<ListBucketResult>
              <IsTruncated>true</IsTruncated>
              <NextContinuationToken>token-1</NextContinuationToken>
              <Contents><Key>0_gregoire/abc/data.zip</Key></Contents>
            </ListBucketResult>"#;
        let page: ListBucketResult = quick_xml::de::from_str(raw).unwrap();
        assert!(page.is_truncated);
        assert_eq!(page.next_continuation_token.as_deref(), Some("token-1"));
    }

    #[test]
    fn marker_object_sorts_ahead_of_children() {
        let entries = assemble_entries(
            "bucket",
            vec!["0_gregoire/".to_string()],
            vec!["0_gregoire/xyz/".to_string(), "0_gregoire/abc/".to_string()],
        );
        assert_eq!(
            entries,
            [
                "bucket/0_gregoire/",
                "bucket/0_gregoire/abc",
                "bucket/0_gregoire/xyz",
            ]
        );
    }

    #[test]
    fn empty_listing_parses() {
        let raw = "<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>";
        let page: ListBucketResult = quick_xml::de::from_str(raw).unwrap();
        assert!(page.contents.is_empty());
        assert!(page.common_prefixes.is_empty());
    }
}
