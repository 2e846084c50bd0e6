use std::path::PathBuf;

use clap::{Parser, Subcommand};
use datacite::ProfileKind;
use mead_engine::config::{
    DEFAULT_BUCKET, DEFAULT_DOI_PREFIX, DEFAULT_ENDPOINT, DEFAULT_FOLDER, DEFAULT_METADATA_FILE,
};

#[derive(Parser, Debug)]
#[command(
    name = "mead",
    version,
    about = "MEAD dataset ingestion: S3 bucket to CaltechDATA records with registered DataCite DOIs"
)]
pub struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest every remaining record under the bucket folder
    Run {
        /// Folder under the bucket whose children are candidate records
        #[arg(long, default_value = DEFAULT_FOLDER)]
        folder: String,

        /// Normalization profile to apply
        #[arg(long, value_enum, default_value = "hte")]
        profile: ProfileKind,

        /// Per-record metadata object name
        #[arg(long, default_value = DEFAULT_METADATA_FILE)]
        metadata_file: String,

        /// Completed ledger file
        #[arg(long, default_value = "completed_dois.json")]
        completed: PathBuf,

        /// Excluded ledger file
        #[arg(long, default_value = "excluded_dois.json")]
        excluded: PathBuf,

        /// Repository community for created records
        #[arg(long)]
        community: Option<String>,

        /// Write against the production repository
        #[arg(long)]
        production: bool,

        /// S3-compatible storage endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Bucket holding the dataset folders
        #[arg(long, default_value = DEFAULT_BUCKET)]
        bucket: String,

        /// DOI prefix candidate identifiers are minted under
        #[arg(long, default_value = DEFAULT_DOI_PREFIX)]
        doi_prefix: String,
    },

    /// Write one DataCite 4.3 JSON record (and files) to the repository
    Write {
        /// DataCite metadata JSON file
        json_file: PathBuf,

        /// File links to attach to the record
        #[arg(long = "fnames", num_args = 0..)]
        fnames: Vec<String>,

        /// Metadata schema version
        #[arg(long, default_value = "43")]
        schema: String,

        /// Write against the production repository
        #[arg(long)]
        production: bool,
    },

    /// Replace the metadata of an existing repository record
    Edit {
        /// Internal repository record id
        record_id: String,

        /// DataCite metadata JSON file
        json_file: PathBuf,

        /// Also retarget this DOI at the updated record
        #[arg(long)]
        doi: Option<String>,

        /// Edit against the production repository
        #[arg(long)]
        production: bool,
    },

    /// Download the media content behind DOIs
    Download {
        /// DOIs whose files should be downloaded
        #[arg(required = true)]
        dois: Vec<String>,

        /// Output file name (defaults to the DOI with `/` replaced by `-`)
        #[arg(long)]
        fname: Option<PathBuf>,

        /// Select the media entry with this media type
        #[arg(long)]
        media_type: Option<String>,
    },
}
