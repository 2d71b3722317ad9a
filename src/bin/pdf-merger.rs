//! PDF Merger CLI tool
//!
//! A command-line front end for merging PDFs in order and previewing pages.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pdf_merger::pdf::{extract_metadata, merge, merge_pdfs, merged_output_path, MergeOptions};
use pdf_merger::render::{PdfiumRasterizer, RenderOptions, Thumbnailer};
use pdf_merger::selection::Selection;

/// PDF Merger - Merge PDFs left to right and preview their pages
#[derive(Parser)]
#[command(name = "pdf-merger")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge two files into intro/merged.pdf
    pdf-merger merge intro/cover.pdf body.pdf

    # Merge numbered PDFs in order under a chosen name
    pdf-merger merge --name handout \"[0-9]*.pdf\"

    # Save a thumbnail of the second page
    pdf-merger thumbnail report.pdf -o report.png --page 1")]
struct Cli {
    /// Increase log detail (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge PDF files into one, in the order given
    Merge {
        /// Input PDF files (left to right). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output file name without extension
        #[arg(short, long, default_value = "merged")]
        name: String,

        /// Write into this directory instead of the first input's directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Render a page as a rounded 300x400 PNG thumbnail
    Thumbnail {
        /// Input PDF file
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Zero-based page to render
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Render scale relative to the page size in points
        #[arg(long, default_value_t = 0.3)]
        scale: f32,

        /// Corner radius in pixels
        #[arg(long, default_value_t = 12)]
        radius: u32,

        /// Directory containing the PDFium shared library
        #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH")]
        pdfium_dir: Option<PathBuf>,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Merge { inputs, name, output_dir, open } => {
            cmd_merge(inputs, &name, output_dir, open)
        }
        Commands::Thumbnail { input, output, page, scale, radius, pdfium_dir } => {
            let options = RenderOptions {
                page_index: page,
                scale,
                corner_radius: radius,
            };
            cmd_thumbnail(&input, &output, &options, pdfium_dir.as_deref())
        }
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand glob patterns in input paths.
///
/// Matches of one pattern are sorted; the patterns themselves keep the
/// order they were given in.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Merge PDFs in argument order
fn cmd_merge(inputs: Vec<String>, name: &str, output_dir: Option<PathBuf>, open: bool) -> Result<()> {
    let selection: Selection = expand_globs(inputs)?.into_iter().collect();

    eprintln!("Merging {} PDF files...", selection.len());

    let output = match output_dir {
        Some(dir) => {
            // Same naming rules as the default location, different directory
            let file_name = merged_output_path(Path::new("input.pdf"), name)?;
            let output_path = dir.join(file_name.file_name().unwrap_or_default());
            merge_pdfs(&MergeOptions {
                input_paths: selection.paths().to_vec(),
                output_path: output_path.clone(),
            })?;
            output_path
        }
        None => merge(name, selection.paths())?,
    };

    eprintln!("Merged to: {}", output.display());

    if open {
        open_file(&output).context("Failed to open merged file")?;
    }

    Ok(())
}

/// Render one page to a PNG thumbnail
fn cmd_thumbnail(
    input: &Path,
    output: &Path,
    options: &RenderOptions,
    pdfium_dir: Option<&Path>,
) -> Result<()> {
    let rasterizer = PdfiumRasterizer::bind(pdfium_dir)?;
    let thumbnailer = Thumbnailer::new(rasterizer);

    let thumbnail = thumbnailer.render_page(input, options)?;
    thumbnail.save_png(output)?;

    eprintln!("Thumbnail: {}", output.display());
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}
