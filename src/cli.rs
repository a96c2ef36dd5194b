use clap::{Args, Parser, Subcommand};

use crate::comic_info::DEFAULT_VOLUME_SPLIT;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Make(MakeArgs),
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct MakeArgs {
    /// Work data JSON written by the scraper.
    #[arg(long)]
    pub work: String,

    /// Comic library root; archives go to `<library>/<series>/`.
    #[arg(long)]
    pub library: String,

    /// 1-based chapter index into the work's chapter list.
    #[arg(long, required_unless_present = "all", conflicts_with = "all")]
    pub chapter: Option<usize>,

    /// Convert every chapter of the work.
    #[arg(long)]
    pub all: bool,

    /// Site identifier selecting the resolver (default: the work's `site_name`).
    #[arg(long)]
    pub site: Option<String>,

    /// Spacing between volumes when flattening chapter numbers.
    #[arg(long, default_value_t = DEFAULT_VOLUME_SPLIT)]
    pub volume_split: u32,

    /// Archive compression level, 0-9 (default: CBZIFY_COMPRESSION_LEVEL or 1).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression_level: Option<u8>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Work data JSON written by the scraper.
    #[arg(long)]
    pub work: String,

    /// 1-based chapter index into the work's chapter list.
    #[arg(long)]
    pub chapter: usize,

    /// Site identifier selecting the resolver (default: the work's `site_name`).
    #[arg(long)]
    pub site: Option<String>,

    /// Spacing between volumes when flattening chapter numbers.
    #[arg(long, default_value_t = DEFAULT_VOLUME_SPLIT)]
    pub volume_split: u32,
}
