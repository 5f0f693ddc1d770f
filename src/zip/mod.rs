//! ZIP archive construction and EPUB packaging.
//!
//! This module produces complete ZIP archives from in-memory entries,
//! including the EPUB3 flavor where a stored `mimetype` entry must come
//! first.
//!
//! ## Architecture
//!
//! The module is organized into four components:
//!
//! - [`structures`]: Data structures representing ZIP format elements
//!   (local/central file headers, EOCD) with their exact byte layouts
//! - [`crc32`]: The CRC-32 checksum readers use to validate entries
//! - [`writer`]: The archive builder that turns an ordered entry list into
//!   one contiguous byte buffer
//! - [`epub`]: EPUB3 package assembly on top of the writer
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and stored data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation writes those pieces in that physical order, with
//! entry offsets accumulated as local headers are emitted; readers locate
//! entries through the central directory, not physical order.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible), version 20
//! - STORED (no compression) method
//! - DEFLATE compression method, kept only when it actually shrinks data
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No ZIP64: archives stay under 4 GiB and 65535 entries

mod crc32;
mod epub;
mod structures;
mod writer;

pub use crc32::crc32;
pub use epub::{
    Chapter, EPUB_MIMETYPE, EpubBuilder, EpubMetadata, Resource, ensure_mimetype_first,
    media_type_for,
};
pub use structures::*;
pub use writer::{ArchiveEntry, ZipArchiveBuilder, build_archive};
