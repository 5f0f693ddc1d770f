//! Main entry point for the ruzip CLI application.
//!
//! This binary packs local files and directories into ZIP archives and
//! EPUB e-books. Two modes are supported: packing entries as they are
//! found on disk, and composing a fresh EPUB from chapter/resource files
//! via `--title`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use tokio::fs;

use ruzip::{
    Chapter, Cli, EpubBuilder, EpubMetadata, ZipArchiveBuilder, collect_entries,
    ensure_mimetype_first,
};

/// Application entry point.
///
/// Parses command-line arguments, builds the archive in memory, and writes
/// it out in one piece.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.inputs.is_empty() {
        bail!("Nothing to pack (no input files given)");
    }

    let output = Path::new(&cli.archive);
    if output.exists() && !cli.overwrite {
        bail!("{} already exists (use -o to overwrite)", cli.archive);
    }

    let archive = if let Some(title) = &cli.title {
        compose_epub(&cli, title).await?
    } else {
        pack_entries(&cli).await?
    };

    fs::write(output, &archive)
        .await
        .with_context(|| format!("Cannot write {}", cli.archive))?;

    if !cli.is_very_quiet() {
        eprintln!(
            "Wrote {} ({})",
            cli.archive,
            format_size(archive.len() as u64)
        );
    }

    Ok(())
}

/// Pack the inputs as-is: every file becomes one archive entry.
///
/// When the output is an EPUB, the `mimetype` entry is forced to the front
/// (and synthesized if the inputs carry none) so readers can sniff the
/// format from offset 0.
async fn pack_entries(cli: &Cli) -> Result<Vec<u8>> {
    let mut entries = collect_entries(&cli.inputs, cli.junk_paths, cli.store_only).await?;

    if cli.is_epub_output() {
        ensure_mimetype_first(&mut entries);
    }

    let mut builder = ZipArchiveBuilder::new();
    let mut total_in = 0u64;
    for entry in entries {
        if !cli.is_quiet() {
            println!("  adding: {}", entry.name);
        }
        total_in += entry.payload.len() as u64;
        builder.add_entry(entry)?;
    }

    let count = builder.len();
    let archive = builder.build()?;

    if !cli.is_quiet() {
        println!(
            "{} entries, {} in, {} out",
            count,
            format_size(total_in),
            format_size(archive.len() as u64)
        );
    }

    Ok(archive)
}

/// Compose an EPUB from loose input files.
///
/// XHTML/HTML inputs become chapters in the order given (chapter title =
/// file stem), the first CSS input becomes the book stylesheet, and
/// everything else is carried as an embedded resource under its base name.
async fn compose_epub(cli: &Cli, title: &str) -> Result<Vec<u8>> {
    let mut metadata = EpubMetadata::new(title, cli.author.as_str());
    metadata.language = cli.language.clone();

    let mut builder = EpubBuilder::new(metadata);

    for input in &cli.inputs {
        let path = Path::new(input);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xhtml" | "html" | "htm" => {
                let body = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Cannot read chapter {input}"))?;
                let chapter_title = file_stem(path)?;
                if !cli.is_quiet() {
                    println!("  chapter: {input}");
                }
                builder.add_chapter(Chapter::new(chapter_title, body));
            }
            "css" => {
                let css = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Cannot read stylesheet {input}"))?;
                if !cli.is_quiet() {
                    println!("  stylesheet: {input}");
                }
                builder.set_stylesheet(css);
            }
            _ => {
                let data = fs::read(path)
                    .await
                    .with_context(|| format!("Cannot read resource {input}"))?;
                let name = file_name(path)?;
                if !cli.is_quiet() {
                    println!("  resource: {input}");
                }
                builder.add_resource(name, data);
            }
        }
    }

    builder.build()
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .with_context(|| format!("Unusable file name: {}", path.display()))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .with_context(|| format!("Unusable file name: {}", path.display()))
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
