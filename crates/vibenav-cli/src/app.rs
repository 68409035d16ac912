//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vibenav_core::PlaceSelection;

#[derive(Parser)]
#[command(name = "vibenav")]
#[command(
    author,
    version,
    about = "Ask questions about places from their Google Maps and Reddit reviews"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to VIBENAV_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag places with vibe labels and write <input>_tagged.json
    Tag(TagArgs),

    /// Tag, chunk and embed a place file into a vector index
    Index(IndexArgs),

    /// Search review chunks
    Search(SearchArgs),

    /// Route a question to one place and print a structured JSON answer
    Query(QueryArgs),

    /// Ask a question about a named place using all its reviews
    Ask(AskArgs),

    /// Generate vibe profiles for places
    Profile(ProfileArgs),

    /// Show vibe cards for places that already have a profile
    Cards(CardsArgs),

    /// Preview how reviews would be chunked (no network)
    Chunk(ChunkArgs),

    /// Show vector index status
    Status(StatusArgs),
}

/// Where to find a place file
#[derive(Args, Clone)]
pub struct PlacesArgs {
    /// Place file (JSON array)
    #[arg(long)]
    pub places: Option<PathBuf>,

    /// Category, e.g. gym (with --city, resolves the file under data_dir)
    #[arg(long)]
    pub category: Option<String>,

    /// City, e.g. pune
    #[arg(long)]
    pub city: Option<String>,
}

#[derive(Args)]
pub struct TagArgs {
    /// Place file (JSON array)
    pub input: PathBuf,

    /// Places classified concurrently
    #[arg(short, long, default_value = "2")]
    pub workers: usize,

    /// Also generate vibe profiles
    #[arg(long)]
    pub profile: bool,
}

#[derive(Args)]
pub struct IndexArgs {
    /// Place file (JSON array)
    pub input: PathBuf,

    /// Index directory (defaults to index_dir from config)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Skip tagging (input is already tagged)
    #[arg(long)]
    pub no_classify: bool,

    /// Also generate vibe profiles
    #[arg(long)]
    pub profile: bool,

    /// Places classified concurrently
    #[arg(short, long, default_value = "2")]
    pub workers: usize,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: Vec<String>,

    /// Number of results
    #[arg(short = 'n', default_value = "10")]
    pub limit: usize,

    /// Keep only chunks with one of these tags (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Use maximal marginal relevance for more diverse results
    #[arg(long)]
    pub mmr: bool,

    /// MMR candidate pool (defaults to retrieval.fetch_k)
    #[arg(long)]
    pub fetch_k: Option<usize>,

    /// MMR relevance/diversity trade-off (defaults to retrieval.mmr_lambda)
    #[arg(long)]
    pub lambda: Option<f32>,

    /// Show full chunk text
    #[arg(long)]
    pub full: bool,

    /// Index directory (defaults to index_dir from config)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Question, e.g. "Suggest a yoga-friendly gym in Pune"
    pub query: Vec<String>,

    /// Required tags (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub places: PlacesArgs,

    /// Place selection policy when several places match
    #[arg(long)]
    pub selection: Option<PlaceSelection>,

    /// Index directory (defaults to index_dir from config)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct AskArgs {
    /// Place name, as in the place file
    pub place: String,

    /// Question about the place
    pub question: Vec<String>,

    #[command(flatten)]
    pub places: PlacesArgs,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// Place file (JSON array)
    pub input: PathBuf,

    /// Profile only the place with this name
    #[arg(long)]
    pub name: Option<String>,

    /// Write profiles back into <input>_tagged.json
    #[arg(long)]
    pub write: bool,
}

#[derive(Args)]
pub struct CardsArgs {
    #[command(flatten)]
    pub places: PlacesArgs,
}

#[derive(Args)]
pub struct ChunkArgs {
    /// Place file (JSON array); omit to chunk --text
    pub input: Option<PathBuf>,

    /// Raw text to chunk instead of a place file
    #[arg(long, conflicts_with = "input")]
    pub text: Option<String>,

    /// Chunk size in characters (defaults to chunking.chunk_size)
    #[arg(long)]
    pub size: Option<usize>,

    /// Overlap in characters (defaults to chunking.chunk_overlap)
    #[arg(long)]
    pub overlap: Option<usize>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Index directory (defaults to index_dir from config)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
