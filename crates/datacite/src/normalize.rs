//! Metadata normalization for DataCite 4.3 submission.
//!
//! The normalizer is a [`TransformPipeline`] of named, pure steps applied
//! in a fixed declared order. Later steps depend on earlier ones: empty
//! field pruning must run after the static blocks may have introduced or
//! emptied lists, and agent cleanup must run before server-assigned field
//! stripping removes the record-level `doi`.
//!
//! Two deployment profiles exist, covering the two historical entry
//! points of the workflow. They share every step and differ only in the
//! funding block, the description policy, and two submission details
//! (`language` stripping, whether zip links ride along with the write).

use ingest_common::{BoxError, Document, Transform, TransformPipeline};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::SCHEMA_VERSION;

/// Abstract attached to every record that does not already carry one.
const MEAD_ABSTRACT: &str = "This record is a component of the Materials Experiment and \
Analysis Database (MEAD). It contains raw data and metadata from millions \
of materials synthesis and characterization experiments, as well as the \
analysis and distillation of that data into property and performance \
metrics. The unprecedented quantity and diversity of experimental data \
are searchable by experiment and analysis attributes generated by both \
researchers and data processing software.";

/// Collection-level DOI every record is a part of.
const MEAD_PARENT_DOI: &str = "10.25989/es8t-kswe";

/// The paper documenting the dataset collection.
const MEAD_PAPER_DOI: &str = "10.1038/s41524-019-0216-x";

const MEAD_FUNDER: &str = "Office of Science of the U.S. Department of Energy";
const MEAD_AWARD_TITLE: &str = "Energy Innovation Hub Renewal - Fuels from Sunlight";
const MEAD_AWARD_NUMBER: &str = "DE-SC0004993";

/// Server-assigned fields the write API rejects.
const SERVER_FIELDS: [&str; 7] = [
    "id",
    "doi",
    "container",
    "providerId",
    "clientId",
    "agency",
    "state",
];

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The record already carries descriptions where the profile expects
    /// to insert the canonical abstract. Merging silently would hide a
    /// source inconsistency, so the run stops here.
    #[error("record already carries descriptions: {existing}")]
    UnexpectedDescriptions { existing: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedIdentifier {
    pub related_identifier: String,
    pub relation_type: String,
    pub related_identifier_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FundingReference {
    pub funder_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub award_title: Option<String>,
    pub award_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rights {
    pub rights: String,
    pub rights_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub description: String,
    pub description_type: String,
}

/// Which historical entry point's behavior to reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ProfileKind {
    /// Full HTE ingestion: abstract-or-halt descriptions, award title in
    /// the funding block, `language` stripped before submission, zip
    /// links attached to the write.
    Hte,
    /// Pilot phase 1: HTML file-listing description appended alongside
    /// the abstract, no award title, `language` kept, no file links on
    /// the write call.
    Pilot,
}

/// Static blocks and submission behavior for one deployment profile.
#[derive(Debug, Clone)]
pub struct NormalizeProfile {
    pub kind: ProfileKind,
    pub abstract_text: String,
    pub related_identifiers: Vec<RelatedIdentifier>,
    pub funding: FundingReference,
    pub rights: Rights,
    /// Strip `language` after validation, before submission.
    pub drop_language: bool,
    /// Attach discovered zip links to the repository write call.
    pub attach_file_links: bool,
}

impl NormalizeProfile {
    pub fn hte() -> Self {
        Self {
            kind: ProfileKind::Hte,
            abstract_text: MEAD_ABSTRACT.to_string(),
            related_identifiers: mead_related_identifiers(),
            funding: FundingReference {
                funder_name: MEAD_FUNDER.to_string(),
                award_title: Some(MEAD_AWARD_TITLE.to_string()),
                award_number: MEAD_AWARD_NUMBER.to_string(),
            },
            rights: cc_by_sa_rights(),
            drop_language: true,
            attach_file_links: true,
        }
    }

    pub fn pilot() -> Self {
        Self {
            kind: ProfileKind::Pilot,
            abstract_text: MEAD_ABSTRACT.to_string(),
            related_identifiers: mead_related_identifiers(),
            funding: FundingReference {
                funder_name: MEAD_FUNDER.to_string(),
                award_title: None,
                award_number: MEAD_AWARD_NUMBER.to_string(),
            },
            rights: cc_by_sa_rights(),
            drop_language: false,
            attach_file_links: false,
        }
    }

    pub fn for_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Hte => Self::hte(),
            ProfileKind::Pilot => Self::pilot(),
        }
    }
}

fn mead_related_identifiers() -> Vec<RelatedIdentifier> {
    vec![
        RelatedIdentifier {
            related_identifier: MEAD_PARENT_DOI.to_string(),
            relation_type: "IsPartOf".to_string(),
            related_identifier_type: "DOI".to_string(),
        },
        RelatedIdentifier {
            related_identifier: MEAD_PAPER_DOI.to_string(),
            relation_type: "IsDocumentedBy".to_string(),
            related_identifier_type: "DOI".to_string(),
        },
    ]
}

fn cc_by_sa_rights() -> Rights {
    Rights {
        rights: "cc-by-sa-4.0".to_string(),
        rights_uri: "http://creativecommons.org/licenses/by-sa/4.0/".to_string(),
    }
}

/// How the `apply-descriptions` step treats the `descriptions` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionPolicy {
    /// Insert the canonical abstract; a pre-existing field is fatal.
    InsertAbstract { text: String },
    /// Append the given entries to any existing list.
    Append { entries: Vec<Description> },
}

/// Build the description policy a profile mandates for one record.
pub fn description_policy(
    profile: &NormalizeProfile,
    endpoint: &str,
    bucket_path: &str,
    file_links: &[String],
) -> DescriptionPolicy {
    match profile.kind {
        ProfileKind::Hte => DescriptionPolicy::InsertAbstract {
            text: profile.abstract_text.clone(),
        },
        ProfileKind::Pilot => DescriptionPolicy::Append {
            entries: vec![
                Description {
                    description: file_listing_description(endpoint, bucket_path, file_links),
                    description_type: "Other".to_string(),
                },
                Description {
                    description: profile.abstract_text.clone(),
                    description_type: "Abstract".to_string(),
                },
            ],
        },
    }
}

/// HTML download listing shown on pilot landing pages.
pub fn file_listing_description(endpoint: &str, bucket_path: &str, file_links: &[String]) -> String {
    let mut listing = format!("Files available via S3 at {endpoint}{bucket_path}<br>");
    for link in file_links {
        let fname = link.rsplit('/').next().unwrap_or(link);
        listing.push_str(&format!(
            "{fname} <a class=\"btn btn-xs piwik_download\" \
             type=\"application/octet-stream\" href=\"{link}\">\
             <i class=\"fa fa-download\"></i> Download</a>    <br>"
        ));
    }
    listing
}

/// Assemble the full normalization pipeline for one record.
pub fn build_pipeline(
    profile: &NormalizeProfile,
    record_id: &str,
    descriptions: DescriptionPolicy,
) -> TransformPipeline {
    TransformPipeline::new()
        .add_step(SetIdentifiers {
            record_id: record_id.to_string(),
        })
        .add_step(SetResourceType)
        .add_step(SetSchemaVersion)
        .add_step(CoercePublicationYear)
        .add_step(SetRights {
            entry: profile.rights.clone(),
        })
        .add_step(AppendRelatedIdentifiers {
            entries: profile.related_identifiers.clone(),
        })
        .add_step(SetFunding {
            entry: profile.funding.clone(),
        })
        .add_step(ApplyDescriptions {
            policy: descriptions,
        })
        .add_step(PruneEmptyFields)
        .add_step(CleanAgents)
        .add_step(StripServerFields)
        .add_step(CoerceDates)
}

struct SetIdentifiers {
    record_id: String,
}

impl Transform for SetIdentifiers {
    fn name(&self) -> &'static str {
        "set-identifiers"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        doc.insert(
            "identifiers".to_string(),
            json!([{ "identifier": self.record_id, "identifierType": "DOI" }]),
        );
        Ok(doc)
    }
}

struct SetResourceType;

impl Transform for SetResourceType {
    fn name(&self) -> &'static str {
        "set-resource-type"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        doc.insert(
            "types".to_string(),
            json!({ "resourceType": "", "resourceTypeGeneral": "Dataset" }),
        );
        Ok(doc)
    }
}

struct SetSchemaVersion;

impl Transform for SetSchemaVersion {
    fn name(&self) -> &'static str {
        "set-schema-version"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        doc.insert("schemaVersion".to_string(), json!(SCHEMA_VERSION));
        Ok(doc)
    }
}

struct CoercePublicationYear;

impl Transform for CoercePublicationYear {
    fn name(&self) -> &'static str {
        "coerce-publication-year"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        if let Some(year) = doc.get_mut("publicationYear")
            && !year.is_string()
        {
            *year = Value::String(scalar_to_string(year));
        }
        Ok(doc)
    }
}

struct SetRights {
    entry: Rights,
}

impl Transform for SetRights {
    fn name(&self) -> &'static str {
        "set-rights"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        doc.insert("rightsList".to_string(), json!([self.entry]));
        Ok(doc)
    }
}

struct AppendRelatedIdentifiers {
    entries: Vec<RelatedIdentifier>,
}

impl Transform for AppendRelatedIdentifiers {
    fn name(&self) -> &'static str {
        "append-related-identifiers"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        let new_entries: Vec<Value> = self
            .entries
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;
        match doc.get_mut("relatedIdentifiers") {
            Some(Value::Array(existing)) => existing.extend(new_entries),
            _ => {
                doc.insert("relatedIdentifiers".to_string(), Value::Array(new_entries));
            }
        }
        Ok(doc)
    }
}

struct SetFunding {
    entry: FundingReference,
}

impl Transform for SetFunding {
    fn name(&self) -> &'static str {
        "set-funding"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        doc.insert("fundingReferences".to_string(), json!([self.entry]));
        Ok(doc)
    }
}

struct ApplyDescriptions {
    policy: DescriptionPolicy,
}

impl Transform for ApplyDescriptions {
    fn name(&self) -> &'static str {
        "apply-descriptions"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        match &self.policy {
            DescriptionPolicy::InsertAbstract { text } => {
                if let Some(existing) = doc.get("descriptions") {
                    return Err(Box::new(NormalizeError::UnexpectedDescriptions {
                        existing: existing.to_string(),
                    }));
                }
                doc.insert(
                    "descriptions".to_string(),
                    json!([{ "description": text, "descriptionType": "Abstract" }]),
                );
            }
            DescriptionPolicy::Append { entries } => {
                let new_entries: Vec<Value> = entries
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<Result<_, _>>()?;
                match doc.get_mut("descriptions") {
                    Some(Value::Array(existing)) => existing.extend(new_entries),
                    _ => {
                        doc.insert("descriptions".to_string(), Value::Array(new_entries));
                    }
                }
            }
        }
        Ok(doc)
    }
}

struct PruneEmptyFields;

impl Transform for PruneEmptyFields {
    fn name(&self) -> &'static str {
        "prune-empty-fields"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        doc.retain(|_, value| !matches!(value, Value::Array(items) if items.is_empty()));
        Ok(doc)
    }
}

struct CleanAgents;

impl Transform for CleanAgents {
    fn name(&self) -> &'static str {
        "clean-agents"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        for key in ["contributors", "creators"] {
            if let Some(Value::Array(agents)) = doc.get_mut(key) {
                for agent in agents.iter_mut() {
                    if let Value::Object(fields) = agent
                        && matches!(fields.get("affiliation"), Some(Value::Array(a)) if a.is_empty())
                    {
                        fields.remove("affiliation");
                    }
                }
            }
        }
        // "Contributors" is a placeholder creator in the source data.
        if let Some(Value::Array(creators)) = doc.get_mut("creators") {
            creators.retain(|creator| {
                creator.get("name").and_then(Value::as_str) != Some("Contributors")
            });
        }
        Ok(doc)
    }
}

struct StripServerFields;

impl Transform for StripServerFields {
    fn name(&self) -> &'static str {
        "strip-server-fields"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        for field in SERVER_FIELDS {
            doc.remove(field);
        }
        Ok(doc)
    }
}

struct CoerceDates;

impl Transform for CoerceDates {
    fn name(&self) -> &'static str {
        "coerce-dates"
    }

    fn apply(&self, mut doc: Document) -> Result<Document, BoxError> {
        if let Some(Value::Array(dates)) = doc.get_mut("dates") {
            for entry in dates.iter_mut() {
                if let Value::Object(fields) = entry
                    && let Some(date) = fields.get_mut("date")
                    && !date.is_string()
                {
                    *date = Value::String(scalar_to_string(date));
                }
            }
        }
        Ok(doc)
    }
}

/// Render a scalar JSON value the way the schema expects strings.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_from(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn hte_pipeline(record_id: &str) -> TransformPipeline {
        let profile = NormalizeProfile::hte();
        let policy = description_policy(&profile, "https://example.org/", "bucket/folder/", &[]);
        build_pipeline(&profile, record_id, policy)
    }

    fn minimal_doc() -> Document {
        doc_from(json!({
            "publicationYear": 2020,
            "creators": [{ "name": "Gregoire, John", "affiliation": [] }],
            "contributors": [{ "name": "Caltech Library", "affiliation": [] }],
            "titles": [{ "title": "Materials record" }],
            "publisher": "CaltechDATA",
        }))
    }

    #[test]
    fn publication_year_is_coerced_to_string() {
        let result = hte_pipeline("10.25989/abc").run(minimal_doc()).unwrap();
        assert_eq!(result.get("publicationYear"), Some(&json!("2020")));
    }

    #[test]
    fn string_publication_year_is_untouched() {
        let mut doc = minimal_doc();
        doc.insert("publicationYear".to_string(), json!("2019"));
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        assert_eq!(result.get("publicationYear"), Some(&json!("2019")));
    }

    #[test]
    fn identifiers_reference_the_record_doi() {
        let result = hte_pipeline("10.25989/abc").run(minimal_doc()).unwrap();
        assert_eq!(
            result.get("identifiers"),
            Some(&json!([{ "identifier": "10.25989/abc", "identifierType": "DOI" }]))
        );
    }

    #[test]
    fn empty_sequence_fields_are_pruned() {
        let mut doc = minimal_doc();
        doc.insert("subjects".to_string(), json!([]));
        doc.insert("sizes".to_string(), json!([]));
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        assert!(!result.contains_key("subjects"));
        assert!(!result.contains_key("sizes"));
    }

    #[test]
    fn placeholder_creator_is_removed() {
        let mut doc = minimal_doc();
        doc.insert(
            "creators".to_string(),
            json!([
                { "name": "Contributors", "affiliation": [] },
                { "name": "Gregoire, John" },
                { "name": "Contributors" },
            ]),
        );
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        assert_eq!(
            result.get("creators"),
            Some(&json!([{ "name": "Gregoire, John" }]))
        );
    }

    #[test]
    fn creators_without_placeholder_are_kept_as_is() {
        let result = hte_pipeline("10.25989/abc").run(minimal_doc()).unwrap();
        assert_eq!(
            result.get("creators"),
            Some(&json!([{ "name": "Gregoire, John" }]))
        );
    }

    #[test]
    fn empty_affiliations_are_dropped_and_real_ones_kept() {
        let mut doc = minimal_doc();
        doc.insert(
            "contributors".to_string(),
            json!([
                { "name": "Caltech Library", "affiliation": [] },
                { "name": "JCAP", "affiliation": [{ "name": "Caltech" }] },
            ]),
        );
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        assert_eq!(
            result.get("contributors"),
            Some(&json!([
                { "name": "Caltech Library" },
                { "name": "JCAP", "affiliation": [{ "name": "Caltech" }] },
            ]))
        );
    }

    #[test]
    fn server_assigned_fields_are_stripped() {
        let mut doc = minimal_doc();
        for field in SERVER_FIELDS {
            doc.insert(field.to_string(), json!("server value"));
        }
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        for field in SERVER_FIELDS {
            assert!(!result.contains_key(field), "{field} should be stripped");
        }
    }

    #[test]
    fn dates_are_coerced_to_strings() {
        let mut doc = minimal_doc();
        doc.insert(
            "dates".to_string(),
            json!([
                { "date": 2020, "dateType": "Issued" },
                { "date": "2021-05-01", "dateType": "Updated" },
                { "date": 2021.5, "dateType": "Collected" },
            ]),
        );
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        let dates = result.get("dates").and_then(Value::as_array).unwrap();
        for entry in dates {
            assert!(entry.get("date").unwrap().is_string());
        }
        assert_eq!(dates[1].get("date"), Some(&json!("2021-05-01")));
    }

    #[test]
    fn related_identifiers_are_appended_to_existing() {
        let mut doc = minimal_doc();
        doc.insert(
            "relatedIdentifiers".to_string(),
            json!([{
                "relatedIdentifier": "10.5072/existing",
                "relationType": "References",
                "relatedIdentifierType": "DOI",
            }]),
        );
        let result = hte_pipeline("10.25989/abc").run(doc).unwrap();
        let related = result
            .get("relatedIdentifiers")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(related.len(), 3);
        assert_eq!(
            related[1].get("relatedIdentifier"),
            Some(&json!(MEAD_PARENT_DOI))
        );
        assert_eq!(
            related[2].get("relationType"),
            Some(&json!("IsDocumentedBy"))
        );
    }

    #[test]
    fn hte_profile_halts_on_existing_descriptions() {
        let mut doc = minimal_doc();
        doc.insert(
            "descriptions".to_string(),
            json!([{ "description": "pre-existing", "descriptionType": "Abstract" }]),
        );
        let err = hte_pipeline("10.25989/abc").run(doc).unwrap_err();
        assert_eq!(err.step_name(), Some("apply-descriptions"));
    }

    #[test]
    fn hte_profile_inserts_abstract_when_absent() {
        let result = hte_pipeline("10.25989/abc").run(minimal_doc()).unwrap();
        let descriptions = result.get("descriptions").and_then(Value::as_array).unwrap();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(
            descriptions[0].get("descriptionType"),
            Some(&json!("Abstract"))
        );
    }

    #[test]
    fn pilot_profile_appends_listing_and_abstract() {
        let profile = NormalizeProfile::pilot();
        let links = vec!["https://example.org/bucket/folder/abc/data.zip".to_string()];
        let policy = description_policy(&profile, "https://example.org/", "bucket/folder/", &links);
        let pipeline = build_pipeline(&profile, "10.25989/abc", policy);

        let mut doc = minimal_doc();
        doc.insert(
            "descriptions".to_string(),
            json!([{ "description": "kept", "descriptionType": "Abstract" }]),
        );
        let result = pipeline.run(doc).unwrap();
        let descriptions = result.get("descriptions").and_then(Value::as_array).unwrap();
        assert_eq!(descriptions.len(), 3);
        let listing = descriptions[1].get("description").unwrap().as_str().unwrap();
        assert!(listing.contains("data.zip"));
        assert_eq!(descriptions[1].get("descriptionType"), Some(&json!("Other")));
        assert_eq!(
            descriptions[2].get("descriptionType"),
            Some(&json!("Abstract"))
        );
    }

    #[test]
    fn pilot_funding_has_no_award_title() {
        let profile = NormalizeProfile::pilot();
        let policy = description_policy(&profile, "https://example.org/", "bucket/folder/", &[]);
        let result = build_pipeline(&profile, "10.25989/abc", policy)
            .run(minimal_doc())
            .unwrap();
        let funding = result
            .get("fundingReferences")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(funding[0].get("funderName"), Some(&json!(MEAD_FUNDER)));
        assert!(funding[0].get("awardTitle").is_none());
    }

    #[test]
    fn hte_funding_carries_award_title() {
        let result = hte_pipeline("10.25989/abc").run(minimal_doc()).unwrap();
        let funding = result
            .get("fundingReferences")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(funding[0].get("awardTitle"), Some(&json!(MEAD_AWARD_TITLE)));
    }

    #[test]
    fn set_steps_and_pruning_are_idempotent() {
        // Rerunning only the set-type and pruning steps must not change an
        // already normalized document. The append steps are exercised once
        // per record by construction.
        let profile = NormalizeProfile::hte();
        let rerun = TransformPipeline::new()
            .add_step(SetResourceType)
            .add_step(SetSchemaVersion)
            .add_step(CoercePublicationYear)
            .add_step(SetRights {
                entry: profile.rights.clone(),
            })
            .add_step(SetFunding {
                entry: profile.funding.clone(),
            })
            .add_step(PruneEmptyFields)
            .add_step(CleanAgents)
            .add_step(StripServerFields)
            .add_step(CoerceDates);

        let once = hte_pipeline("10.25989/abc").run(minimal_doc()).unwrap();
        let twice = rerun.run(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn pipeline_declares_steps_in_submission_order() {
        let names = hte_pipeline("10.25989/abc").step_names();
        assert_eq!(
            names,
            [
                "set-identifiers",
                "set-resource-type",
                "set-schema-version",
                "coerce-publication-year",
                "set-rights",
                "append-related-identifiers",
                "set-funding",
                "apply-descriptions",
                "prune-empty-fields",
                "clean-agents",
                "strip-server-fields",
                "coerce-dates",
            ]
        );
    }
}
