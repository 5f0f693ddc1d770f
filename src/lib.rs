//! # ruzip
//!
//! A Rust zip utility for packaging ZIP archives and EPUB e-books.
//!
//! This library builds complete ZIP archives in memory from an ordered list
//! of named byte payloads. It implements the container format from scratch:
//! local file headers, DEFLATE compression (kept only when it shrinks the
//! data), the central directory, and the end-of-central-directory record,
//! with the CRC-32 checksum readers use for validation. On top of the
//! writer sits an EPUB3 packager that generates the OPF manifest/spine and
//! navigation documents and guarantees the stored `mimetype` entry comes
//! first.
//!
//! ## Features
//!
//! - Byte-exact, deterministic output: the same entries always produce the
//!   same archive
//! - STORED and DEFLATE methods, chosen per entry by what is smaller
//! - EPUB3 packaging with the mandatory uncompressed `mimetype` first entry
//! - No I/O in the core: entries in, one byte buffer out
//!
//! ## Example
//!
//! ```
//! use ruzip::{ArchiveEntry, ZipArchiveBuilder};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut builder = ZipArchiveBuilder::new();
//!     builder.add_entry(ArchiveEntry::stored(
//!         "mimetype",
//!         b"application/epub+zip".to_vec(),
//!     ))?;
//!     builder.add_entry(ArchiveEntry::new(
//!         "OEBPS/content.opf",
//!         b"<package/>".to_vec(),
//!     ))?;
//!
//!     let archive = builder.build()?;
//!     assert_eq!(&archive[0..2], b"PK");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use io::{collect_entries, is_precompressed};
pub use zip::{
    ArchiveEntry, Chapter, EpubBuilder, EpubMetadata, ZipArchiveBuilder, build_archive, crc32,
    ensure_mimetype_first,
};
