//! mhdat CLI - Command-line tool for phenomedia MHA archive extraction.
//!
//! This is the main entry point for the mhdat command-line application.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mhdat::archive::DEFAULT_OUTPUT_ROOT;
use mhdat::prelude::*;

/// mhdat - phenomedia MHA archive extraction tool
#[derive(Parser)]
#[command(name = "mhdat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract all files from an archive
    Extract {
        /// Path to the archive (usually mha.dat)
        #[arg(short, long, env = "MHDAT_ARCHIVE")]
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, env = "MHDAT_OUTPUT", default_value = DEFAULT_OUTPUT_ROOT)]
        output: PathBuf,

        /// Only extract files whose path matches this glob
        #[arg(short, long)]
        filter: Option<String>,

        /// Abort before writing anything if any parent link is broken
        #[arg(long)]
        strict: bool,
    },

    /// List the files in an archive
    List {
        /// Path to the archive
        #[arg(short, long, env = "MHDAT_ARCHIVE")]
        archive: PathBuf,

        /// Only list files whose path matches this glob
        #[arg(short, long)]
        filter: Option<String>,

        /// Show flags and tree links
        #[arg(short, long)]
        detailed: bool,

        /// Print entries as JSON
        #[arg(long, conflicts_with = "detailed")]
        json: bool,
    },

    /// Show the archive header and entry counts
    Info {
        /// Path to the archive
        #[arg(short, long, env = "MHDAT_ARCHIVE")]
        archive: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            archive,
            output,
            filter,
            strict,
        } => {
            cmd_extract(&archive, &output, filter.as_deref(), strict)?;
        }
        Commands::List {
            archive,
            filter,
            detailed,
            json,
        } => {
            cmd_list(&archive, filter.as_deref(), detailed, json)?;
        }
        Commands::Info { archive } => {
            cmd_info(&archive)?;
        }
    }

    Ok(())
}

fn open_archive(path: &Path) -> Result<MhaArchive<impl std::io::Read + std::io::Seek>> {
    MhaArchive::open(path).with_context(|| format!("Failed to open archive {}", path.display()))
}

fn parse_filter(filter: Option<&str>) -> Result<Option<glob::Pattern>> {
    filter
        .map(|pattern| {
            glob::Pattern::new(pattern).with_context(|| format!("Invalid filter pattern {pattern:?}"))
        })
        .transpose()
}

fn cmd_extract(archive_path: &Path, output: &Path, filter: Option<&str>, strict: bool) -> Result<()> {
    println!("Opening archive: {}", archive_path.display());

    let start = Instant::now();
    let mut archive = open_archive(archive_path)?;

    println!("Loaded {} entries in {:?}", archive.entry_count(), start.elapsed());

    let options = ExtractOptions {
        output_root: output.to_path_buf(),
        filter: parse_filter(filter)?,
        strict,
    };

    let selected = archive
        .files()
        .filter(|e| options.selects(archive.tree(), e))
        .count();

    println!("Extracting {} files to {}...", selected, output.display());

    let pb = ProgressBar::new(selected as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let report = extract_with(&mut archive, &options, |outcome| {
        let status = match outcome.result {
            Ok(_) => "Done".to_string(),
            Err(e) => format!("Failed: {e}"),
        };
        pb.println(format!("{}{}", listing_line(outcome.entry), status));
        pb.inc(1);
    })
    .context("Extraction aborted")?;

    pb.finish_with_message("Done");

    println!("\"{}\" {} entries", report.archive_name, report.entry_count);
    println!(
        "Extracted {}/{} files ({:.1}%) in {:?}",
        report.succeeded,
        report.total,
        report.success_percent(),
        start.elapsed()
    );
    if report.size_mismatches > 0 {
        println!("{} files differ from their recorded size", report.size_mismatches);
    }

    Ok(())
}

fn cmd_list(archive_path: &Path, filter: Option<&str>, detailed: bool, json: bool) -> Result<()> {
    let archive = open_archive(archive_path)?;
    let tree = archive.tree();
    let options = ExtractOptions {
        filter: parse_filter(filter)?,
        ..Default::default()
    };

    let mut listed = Vec::new();
    for entry in archive.files().filter(|e| options.selects(tree, e)) {
        let path = tree
            .display_path(entry)
            .unwrap_or_else(|e| format!("<{e}>"));

        if json {
            listed.push(serde_json::json!({ "path": path, "entry": entry }));
        } else if detailed {
            println!(
                "{}{:08X} prev={:#x} next={:#x} parent={:#x} {}",
                listing_line(entry),
                entry.flags,
                entry.offset_prev,
                entry.offset_next,
                entry.links.parent,
                path
            );
        } else {
            println!("{}{}", listing_line(entry), path);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
    } else {
        println!("\n\"{}\" {} entries", archive.name(), archive.entry_count());
    }

    Ok(())
}

fn cmd_info(archive_path: &Path) -> Result<()> {
    let archive = open_archive(archive_path)?;
    let header = archive.header();
    let files = archive.files().count();

    println!("Name:         {}", header.name);
    println!("Version:      {}", header.version);
    println!("Size:         {} bytes", header.archive_size);
    println!("Root offset:  {:#x}", header.root_dir_offset);
    println!("Directories:  {}", archive.entry_count() - files);
    println!("Files:        {}", files);

    Ok(())
}

/// Fixed-width columns: type, two opaque hex fields, sizes, payload offset, name.
fn listing_line(entry: &Entry) -> String {
    match entry.file() {
        Some(record) => format!(
            "{:>2}{:>12X}{:>10X}{:>10}{:>10}{:>10} \"{}\" ",
            record.file_type,
            record.unk2,
            record.unk3,
            record.compressed_size,
            record.decompressed_size,
            record.payload_offset,
            entry.name
        ),
        None => format!("{:>54} \"{}\" ", "", entry.name),
    }
}
