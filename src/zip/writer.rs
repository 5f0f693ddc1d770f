//! In-memory ZIP archive writer.
//!
//! The writer is a pure, synchronous transform: an ordered list of named
//! payloads in, one contiguous byte buffer out. There is no I/O here; the
//! caller decides where the finished archive goes.
//!
//! ## Layout
//!
//! The produced buffer is, in order:
//! 1. One (local file header, stored bytes) pair per entry, in input order
//! 2. One central directory header per entry, in the same order
//! 3. The End of Central Directory record
//!
//! Offsets accumulate as each local header and payload is emitted, so
//! construction of a single archive is strictly sequential. Independent
//! archives share no mutable state and may be built in parallel.
//!
//! ## Limits
//!
//! Zip32 only: sizes and offsets must fit in 32 bits and the entry count in
//! 16 bits. Exceeding either is a build error, not a silent truncation.
//! EPUB-sized inputs are far below both limits.

use std::io::Write;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::DeflateEncoder;

use super::crc32::crc32;
use super::structures::{
    CentralFileHeader, CompressionMethod, EndOfCentralDirectory, LocalFileHeader,
};

/// A single named payload to be placed in an archive.
///
/// `name` is used verbatim as the ZIP entry name, with forward slashes as
/// directory separators. `compress` is a hint: the writer attempts DEFLATE
/// and keeps the result only when it is strictly smaller than the payload.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub payload: Vec<u8>,
    pub compress: bool,
}

impl ArchiveEntry {
    /// An entry that the writer may compress.
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
            compress: true,
        }
    }

    /// An entry that is always stored verbatim (method 0).
    pub fn stored(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
            compress: false,
        }
    }
}

/// Write-once builder for a ZIP archive.
///
/// Entries are validated as they are added and serialized by
/// [`ZipArchiveBuilder::build`], which consumes the builder: there is no update or delete on an archive,
/// and no archive object survives between calls.
///
/// Duplicate entry names are rejected at insertion time. ZIP readers
/// disagree on which of two same-named entries wins, so this writer refuses
/// to produce such archives.
///
/// ## Example
///
/// ```
/// use ruzip::{ArchiveEntry, ZipArchiveBuilder};
///
/// let mut builder = ZipArchiveBuilder::new();
/// builder.add_entry(ArchiveEntry::stored("mimetype", b"application/epub+zip".to_vec()))?;
/// builder.add_entry(ArchiveEntry::new("OEBPS/content.opf", b"<package/>".to_vec()))?;
/// let archive = builder.build()?;
/// # anyhow::Ok(())
/// ```
pub struct ZipArchiveBuilder {
    entries: Vec<ArchiveEntry>,
}

impl ZipArchiveBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, the name is already present in the
    /// archive, or the archive is at the 16-bit entry count limit.
    pub fn add_entry(&mut self, entry: ArchiveEntry) -> Result<()> {
        if entry.name.is_empty() {
            bail!("Entry name must not be empty");
        }
        if self.entries.iter().any(|e| e.name == entry.name) {
            bail!("Duplicate entry name: {}", entry.name);
        }
        if self.entries.len() >= u16::MAX as usize {
            bail!("Archive entry count limit reached (65535, ZIP64 not supported)");
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Serialize all entries into a complete ZIP archive.
    ///
    /// Per entry: the CRC-32 is computed over the uncompressed payload
    /// first, then DEFLATE is attempted for compressible entries and kept
    /// only if it actually shrinks the data. An encoder failure downgrades
    /// that entry to stored; it never aborts the archive.
    ///
    /// # Returns
    ///
    /// The archive as one contiguous buffer, byte-identical across calls
    /// with the same entry list.
    pub fn build(self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut central_headers = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            // CRC over the original bytes, before any compression decision:
            // both the stored and compressed forms checksum the payload.
            let crc = crc32(&entry.payload);
            let uncompressed_size = entry_size_u32(entry.payload.len(), &entry.name)?;

            let (stored_bytes, method) = select_storage(entry);
            let compressed_size = entry_size_u32(stored_bytes.len(), &entry.name)?;

            let lfh_offset = archive_offset_u32(out.len())?;
            let header = LocalFileHeader {
                method,
                crc32: crc,
                compressed_size,
                uncompressed_size,
                file_name: entry.name.clone(),
            };
            header.write_into(&mut out)?;
            out.extend_from_slice(&stored_bytes);

            central_headers.push(CentralFileHeader {
                method,
                crc32: crc,
                compressed_size,
                uncompressed_size,
                lfh_offset,
                file_name: entry.name.clone(),
            });
        }

        let cd_offset = archive_offset_u32(out.len())?;
        for header in &central_headers {
            header.write_into(&mut out)?;
        }
        let cd_size = archive_offset_u32(out.len())? - cd_offset;

        let eocd =
            EndOfCentralDirectory::for_archive(central_headers.len() as u16, cd_size, cd_offset);
        eocd.write_into(&mut out)?;

        Ok(out)
    }
}

impl Default for ZipArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an archive from an already-assembled entry list in one call.
pub fn build_archive(entries: Vec<ArchiveEntry>) -> Result<Vec<u8>> {
    let mut builder = ZipArchiveBuilder::new();
    for entry in entries {
        builder.add_entry(entry)?;
    }
    builder.build()
}

/// Pick the bytes actually written for an entry.
///
/// The compressed candidate is used only when compression was requested AND
/// it is strictly smaller than the payload. Tiny or already-dense data
/// (JPEG, MP3, a 0-byte file) grows under DEFLATE; those stay stored.
fn select_storage(entry: &ArchiveEntry) -> (Vec<u8>, CompressionMethod) {
    if entry.compress {
        if let Some(candidate) = deflate(&entry.payload) {
            if candidate.len() < entry.payload.len() {
                return (candidate, CompressionMethod::Deflate);
            }
        }
    }
    (entry.payload.clone(), CompressionMethod::Stored)
}

/// Raw DEFLATE (no zlib/gzip wrapper), as the ZIP method-8 convention
/// requires. `None` means the encoder failed and the entry falls back to
/// stored storage.
fn deflate(payload: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).ok()?;
    encoder.finish().ok()
}

fn entry_size_u32(len: usize, name: &str) -> Result<u32> {
    u32::try_from(len).with_context(|| format!("Entry too large for Zip32: {name}"))
}

fn archive_offset_u32(len: usize) -> Result<u32> {
    u32::try_from(len).context("Archive exceeds 4 GiB (ZIP64 not supported)")
}
