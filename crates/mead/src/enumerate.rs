//! Candidate record enumeration.

use osn::ObjectStore;

use crate::{EngineError, IngestConfig};

/// List candidate records under the configured folder and derive their
/// DOI-shaped identifiers.
///
/// The first listed entry must be the enumerated prefix itself; anything
/// else means the listing did not return the expected root, and the run
/// aborts before touching any record.
pub async fn enumerate_records(
    store: &dyn ObjectStore,
    config: &IngestConfig,
) -> Result<Vec<String>, EngineError> {
    let path = config.bucket_path();
    let mut entries = store.ls(&path).await?;
    if entries.is_empty() {
        return Err(EngineError::EmptyListing { path });
    }

    let marker = entries.remove(0);
    if marker != path {
        return Err(EngineError::UnexpectedListingRoot {
            expected: path,
            found: marker,
        });
    }

    let folder_prefix = config.folder_prefix();
    entries
        .iter()
        .map(|entry| {
            let body = entry
                .split(&folder_prefix)
                .nth(1)
                .filter(|body| !body.is_empty())
                .ok_or_else(|| EngineError::MalformedEntry {
                    entry: entry.clone(),
                    folder: config.folder.clone(),
                })?;
            Ok(format!("{}/{}", config.doi_prefix, body))
        })
        .collect()
}
