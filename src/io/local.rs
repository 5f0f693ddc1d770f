//! Local filesystem input collection.
//!
//! Turns the files and directories named on the command line into archive
//! entries. Only the binary uses this; the archive writer itself never
//! touches the filesystem.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio::fs;

use crate::zip::ArchiveEntry;

/// Extensions whose payloads are already densely encoded; attempting
/// DEFLATE on them only costs time, so the compress hint is cleared.
const PRECOMPRESSED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "mp3", "m4a", "aac", "ogg", "opus", "mp4", "mov",
    "mkv", "webm", "zip", "gz", "bz2", "xz", "zst", "7z", "epub", "docx", "woff", "woff2",
];

/// Whether a file name looks like an already-compressed format.
pub fn is_precompressed(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => PRECOMPRESSED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Collect archive entries from the given files and directories.
///
/// Directories are walked recursively; their entries are named relative to
/// the directory itself, so packing an unpacked EPUB tree reproduces its
/// internal layout. Files keep their path as given. `junk_paths` reduces
/// every name to its final component; `store_only` disables compression
/// for all entries.
///
/// # Errors
///
/// Fails on unreadable inputs, names that are not valid UTF-8, and paths
/// that escape upward (`..`).
pub async fn collect_entries(
    inputs: &[String],
    junk_paths: bool,
    store_only: bool,
) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        let metadata = fs::metadata(path)
            .await
            .with_context(|| format!("Cannot read {input}"))?;

        if metadata.is_dir() {
            for file in walk_dir(path).await? {
                let relative = file
                    .strip_prefix(path)
                    .context("Walked path outside its root")?;
                let name = entry_name(relative, junk_paths)?;
                entries.push(read_entry(&file, name, store_only).await?);
            }
        } else {
            let name = entry_name(path, junk_paths)?;
            entries.push(read_entry(path, name, store_only).await?);
        }
    }

    Ok(entries)
}

/// Depth-first walk without async recursion. Results are sorted so that
/// archive contents do not depend on platform directory iteration order.
async fn walk_dir(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut read_dir = fs::read_dir(&dir)
            .await
            .with_context(|| format!("Cannot read directory {}", dir.display()))?;
        while let Some(entry) = read_dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

async fn read_entry(path: &Path, name: String, store_only: bool) -> Result<ArchiveEntry> {
    let payload = fs::read(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;

    if store_only || is_precompressed(&name) {
        Ok(ArchiveEntry::stored(name, payload))
    } else {
        Ok(ArchiveEntry::new(name, payload))
    }
}

/// ZIP entry name for a path: UTF-8, forward-slash separated, no drive or
/// parent components.
fn entry_name(path: &Path, junk_paths: bool) -> Result<String> {
    if junk_paths {
        let base = path
            .file_name()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Unusable file name: {}", path.display()))?;
        return Ok(base.to_string());
    }

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .with_context(|| format!("Non-UTF-8 file name: {}", path.display()))?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => bail!(
                "Entry paths must stay relative (got {})",
                path.display()
            ),
        }
    }
    if parts.is_empty() {
        bail!("Empty entry name for {}", path.display());
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precompressed_extensions() {
        assert!(is_precompressed("cover.jpg"));
        assert!(is_precompressed("SONG.MP3"));
        assert!(is_precompressed("nested/book.epub"));
        assert!(!is_precompressed("chapter.xhtml"));
        assert!(!is_precompressed("README"));
    }

    #[test]
    fn entry_name_joins_with_forward_slashes() {
        let name = entry_name(Path::new("OEBPS/images/cover.jpg"), false).unwrap();
        assert_eq!(name, "OEBPS/images/cover.jpg");
    }

    #[test]
    fn entry_name_strips_current_dir() {
        let name = entry_name(Path::new("./notes/day1.xhtml"), false).unwrap();
        assert_eq!(name, "notes/day1.xhtml");
    }

    #[test]
    fn entry_name_junks_directories() {
        let name = entry_name(Path::new("deep/tree/cover.jpg"), true).unwrap();
        assert_eq!(name, "cover.jpg");
    }

    #[test]
    fn entry_name_rejects_parent_components() {
        assert!(entry_name(Path::new("../escape.txt"), false).is_err());
    }

    #[tokio::test]
    async fn collect_from_directory_is_sorted_and_relative() {
        let dir = std::env::temp_dir().join("ruzip_collect_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("OEBPS")).unwrap();
        std::fs::write(dir.join("mimetype"), b"application/epub+zip").unwrap();
        std::fs::write(dir.join("OEBPS/b.xhtml"), b"<p>b</p>").unwrap();
        std::fs::write(dir.join("OEBPS/a.xhtml"), b"<p>a</p>").unwrap();

        let inputs = vec![dir.to_str().unwrap().to_string()];
        let entries = collect_entries(&inputs, false, false).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["OEBPS/a.xhtml", "OEBPS/b.xhtml", "mimetype"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
