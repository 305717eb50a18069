use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use offsite::cli::{Cli, Command};
use offsite::crawler::SiteCrawler;
use offsite::layout::CacheLayout;
use offsite::merger::Merger;
use offsite::report::{CrawlReport, MergeReport};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Mirror {
            url,
            cache_dir,
            merge,
            report_json,
        } => {
            let layout = CacheLayout::new(&cache_dir);
            layout.ensure()?;

            let crawler = SiteCrawler::new(&url, &layout.downloads_dir())?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
            let mut progress = |message: &str| spinner.set_message(message.to_string());

            let report = crawler.run(&mut progress).await?;
            spinner.finish_and_clear();
            print_crawl_summary(&report);

            if let Some(path) = report_json {
                std::fs::write(&path, serde_json::to_vec_pretty(&report)?)?;
                println!("Report written to {}", path.display());
            }

            if merge {
                let site_name = report
                    .output_root
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("site")
                    .to_string();
                let merged = Merger::new(&report.output_root, &site_name)
                    .with_output_dir(&layout.merged_dir())
                    .merge()?;
                print_merge_summary(&merged);
            }
        }
        Command::Merge { tree, name } => {
            let merged = Merger::new(&tree, &name).merge()?;
            print_merge_summary(&merged);
        }
    }

    Ok(())
}

fn print_crawl_summary(report: &CrawlReport) {
    println!(
        "{} {} ({} items)",
        "Mirrored to".green(),
        report.output_root.display(),
        report.succeeded.len()
    );
    if !report.failed.is_empty() {
        println!(
            "{} {} item(s) could not be mirrored:",
            "warning:".yellow(),
            report.failed.len()
        );
        for failure in &report.failed {
            println!("  {} ({})", failure.item, failure.reason);
        }
    }
}

fn print_merge_summary(report: &MergeReport) {
    println!(
        "{} {} ({} assets inlined)",
        "Merged into".green(),
        report.output_file.display(),
        report.inlined.len()
    );
    if !report.failed.is_empty() {
        println!(
            "{} {} asset(s) could not be inlined:",
            "warning:".yellow(),
            report.failed.len()
        );
        for failure in &report.failed {
            println!("  {} ({})", failure.item, failure.reason);
        }
    }
}
