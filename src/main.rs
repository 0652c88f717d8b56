mod db;
mod fetcher;
mod parser;
mod record;
mod schema;

use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::warn;

use record::Extraction;

#[derive(Parser)]
#[command(name = "ipo_scraper", about = "IPO detail-page scraper for chittorgarh.com")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a page into the HTML cache
    Fetch {
        url: String,
        /// Re-download even when a cached copy exists
        #[arg(long)]
        fresh: bool,
    },
    /// Extract one page (cache-first) and print the record as JSON
    Extract {
        url: String,
        /// Bypass the cache and download a fresh copy
        #[arg(long)]
        fresh: bool,
    },
    /// Re-extract every cached page into the offerings table
    Process {
        /// Max pages to process (default: all cached)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extracted offerings table
    Overview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Cache and extraction statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch { url, fresh } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let (html, id) = fetcher::fetch_or_cached(&conn, &url, fresh).await?;
            println!("Cached {} ({} bytes)", id, html.len());
            Ok(())
        }
        Commands::Extract { url, fresh } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let (html, id) = fetcher::fetch_or_cached(&conn, &url, fresh).await?;
            let out = parser::process_page(&html, &url);
            schema::validate(&out.record)?;
            if out.degraded {
                warn!("Document {} has no usable tree; record is all-null", id);
            }
            db::save_offerings(&conn, &[offering_row(&id, &out)])?;
            println!("{}", serde_json::to_string_pretty(&out.record)?);
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_cached(&conn, limit)?;
            if pages.is_empty() {
                println!("No cached pages. Run 'fetch' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let counts = process_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Overview { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, limit)?;
            if rows.is_empty() {
                println!("No offerings extracted yet. Run 'process' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<8} | {:<30} | {:<10} | {:<10} | {:>10}",
                "#", "Id", "Offering", "Open", "Close", "Size ₹Cr"
            );
            println!("{}", "-".repeat(86));

            for (i, r) in rows.iter().enumerate() {
                let name = truncate(&r.name, 30);
                let size = r
                    .issue_size_crore
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "-".into());
                let flag = if r.degraded { " (degraded)" } else { "" };
                println!(
                    "{:>3} | {:<8} | {:<30} | {:<10} | {:<10} | {:>10}{}",
                    i + 1,
                    r.external_id,
                    name,
                    r.open,
                    r.close,
                    size,
                    flag
                );
            }

            println!("\n{} offerings", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Cached pages: {}", s.pages);
            println!("Fetch errors: {}", s.errors);
            println!("Offerings:    {}", s.offerings);
            println!("Degraded:     {}", s.degraded);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    offerings: usize,
    degraded: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} offerings ({} degraded).",
            self.offerings, self.degraded
        );
    }
}

/// Batch re-extraction. Field evaluation is independent per page and per
/// field, so pages fan out across the rayon pool; each worker parses its
/// own tree and nothing is shared between runs.
fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::CachedPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        offerings: 0,
        degraded: 0,
    };

    for chunk in pages.chunks(256) {
        let rows: Vec<db::OfferingRow> = chunk
            .par_iter()
            .map(|page| {
                let out = parser::process_page(&page.html, &page.url);
                offering_row(&page.external_id, &out)
            })
            .collect();

        counts.offerings += rows.len();
        counts.degraded += rows.iter().filter(|r| r.degraded).count();
        db::save_offerings(conn, &rows)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn offering_row(external_id: &str, out: &Extraction) -> db::OfferingRow {
    let r = &out.record;
    db::OfferingRow {
        external_id: external_id.to_string(),
        slug: r.text("slug").map(String::from),
        name: r.text("name").map(String::from),
        issue_size_crore: r.float("issue_size_crore"),
        issue_open_date: r.date_iso("issue_open_date"),
        issue_close_date: r.date_iso("issue_close_date"),
        degraded: out.degraded,
        record_json: serde_json::to_string(r).unwrap_or_default(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
