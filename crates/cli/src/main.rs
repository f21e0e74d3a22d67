//! CLI tool for listing the fonts used by PowerPoint decks.

use anyhow::{Context, Result};
use clap::Parser;
use fontpush_core::FontSet;
use fontpush_remote::{FontFetcher, FontSource, DEFAULT_CATALOG_URL};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// List the fonts used by PowerPoint decks and optionally download them.
#[derive(Parser, Debug)]
#[command(name = "font-scan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Download each font's package into this directory
    #[arg(short, long)]
    fetch_dir: Option<PathBuf>,

    /// Catalog download URL; the family name is appended
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Print one JSON object per file instead of one font per line
    #[arg(short, long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    fonts: &'a FontSet,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let fetcher = match &args.fetch_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create fetch directory: {}", dir.display()))?;
            Some(FontFetcher::new(&args.catalog_url, None)?)
        }
        None => None,
    };

    for input_path in &args.input {
        log::debug!("Processing: {}", input_path.display());

        let fonts = match fontpush_pptx::scan_file(input_path) {
            Ok(fonts) => {
                log::debug!("  Found {} fonts", fonts.len());
                fonts
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", input_path.display(), e);
                continue;
            }
        };

        print_fonts(input_path, &fonts, args.json)?;

        if let (Some(fetcher), Some(dir)) = (&fetcher, &args.fetch_dir) {
            fetch_all(fetcher, &fonts, dir).await;
        }
    }

    Ok(())
}

fn print_fonts(input_path: &Path, fonts: &FontSet, json: bool) -> Result<()> {
    if json {
        let report = FileReport {
            file: input_path.display().to_string(),
            fonts,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        for font in fonts.iter() {
            println!("{}", font);
        }
    }
    Ok(())
}

/// Download every font into `dir`, reporting the ones that are unavailable.
async fn fetch_all(fetcher: &FontFetcher, fonts: &FontSet, dir: &Path) {
    for family in fonts.iter() {
        let Some(archive) = fetcher.fetch(family).await else {
            eprintln!("Font not available: {}", family);
            continue;
        };

        let path = dir.join(archive.file_name());
        match tokio::fs::write(&path, &archive.bytes).await {
            Ok(()) => log::debug!("  Written to: {}", path.display()),
            Err(e) => eprintln!("Error writing {}: {}", path.display(), e),
        }
    }
}
