use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "offsite",
    about = "Mirror a website into a local directory for offline viewing",
    version,
    long_about = "Downloads a static copy of a website's entry page, its assets, and \
first-hop linked pages, rewriting links so the copy browses locally. Can also collapse \
a mirrored tree into a single self-contained HTML file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mirror a website into the local cache
    Mirror {
        /// The URL of the website to mirror
        url: String,

        /// Cache directory holding downloaded trees and merged files
        #[arg(long, default_value = "./cache")]
        cache_dir: PathBuf,

        /// Collapse the mirrored tree into a single HTML file afterwards
        #[arg(long)]
        merge: bool,

        /// Write the crawl report as JSON to this path
        #[arg(long)]
        report_json: Option<PathBuf>,
    },

    /// Merge an already mirrored tree into one self-contained HTML file
    Merge {
        /// Path to a mirrored site tree
        tree: PathBuf,

        /// Logical site name used for the output file name
        #[arg(long)]
        name: String,
    },
}
