//! End-to-end archive verification.
//!
//! Every test builds an archive through the public API, then plays the
//! reader role: EOCD from the tail, central directory walk, local header
//! at each recorded offset, DEFLATE decompression where the method says
//! so, and CRC validation over the recovered bytes.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use ruzip::zip::{CentralFileHeader, CompressionMethod, EndOfCentralDirectory, LocalFileHeader};
use ruzip::{ArchiveEntry, Chapter, EpubBuilder, EpubMetadata, build_archive, crc32};

fn read_central_directory(archive: &[u8]) -> (EndOfCentralDirectory, Vec<CentralFileHeader>) {
    let tail = &archive[archive.len() - EndOfCentralDirectory::SIZE..];
    let eocd = EndOfCentralDirectory::from_bytes(tail).unwrap();

    let mut cursor = Cursor::new(archive);
    cursor.set_position(eocd.cd_offset as u64);
    let mut headers = Vec::new();
    for _ in 0..eocd.total_entries {
        headers.push(CentralFileHeader::read_from(&mut cursor).unwrap());
    }
    (eocd, headers)
}

/// Follow a central directory record to its local header and recover the
/// original payload.
fn extract_entry(archive: &[u8], header: &CentralFileHeader) -> (LocalFileHeader, Vec<u8>) {
    let mut cursor = Cursor::new(archive);
    cursor.set_position(header.lfh_offset as u64);
    let lfh = LocalFileHeader::read_from(&mut cursor).unwrap();

    let start = cursor.position() as usize;
    let stored = &archive[start..start + lfh.compressed_size as usize];

    let payload = match lfh.method {
        CompressionMethod::Stored => stored.to_vec(),
        CompressionMethod::Deflate => {
            let mut out = Vec::new();
            flate2::read::DeflateDecoder::new(stored)
                .read_to_end(&mut out)
                .unwrap();
            out
        }
        CompressionMethod::Unknown(m) => panic!("writer never emits method {m}"),
    };
    (lfh, payload)
}

fn sample_entries() -> Vec<ArchiveEntry> {
    vec![
        ArchiveEntry::stored("mimetype", b"application/epub+zip".to_vec()),
        ArchiveEntry::new(
            "OEBPS/chapter1.xhtml",
            b"<p>It was a dark and stormy night; the rain fell in torrents.</p>".to_vec(),
        ),
        ArchiveEntry::new("OEBPS/empty.txt", Vec::new()),
        ArchiveEntry::stored("OEBPS/images/cover.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
    ]
}

#[test]
fn round_trip_recovers_every_entry() {
    let entries = sample_entries();
    let expected: HashMap<String, Vec<u8>> = entries
        .iter()
        .map(|e| (e.name.clone(), e.payload.clone()))
        .collect();

    let archive = build_archive(entries).unwrap();
    let (eocd, headers) = read_central_directory(&archive);
    assert_eq!(eocd.total_entries as usize, expected.len());

    let mut recovered = HashMap::new();
    for header in &headers {
        let (_, payload) = extract_entry(&archive, header);
        recovered.insert(header.file_name.clone(), payload);
    }
    assert_eq!(recovered, expected);
}

#[test]
fn stored_crc_matches_reader_recomputation() {
    let archive = build_archive(sample_entries()).unwrap();
    let (_, headers) = read_central_directory(&archive);

    for header in &headers {
        let (lfh, payload) = extract_entry(&archive, header);
        // The reader's own validation path: decompress, then hash.
        assert_eq!(header.crc32, crc32fast::hash(&payload), "{}", header.file_name);
        assert_eq!(header.crc32, crc32(&payload));
        assert_eq!(lfh.crc32, header.crc32);
    }
}

#[test]
fn offset_consistency_between_directory_and_local_headers() {
    let archive = build_archive(sample_entries()).unwrap();
    let (_, headers) = read_central_directory(&archive);

    for header in &headers {
        let (lfh, _) = extract_entry(&archive, header);
        assert_eq!(lfh.file_name, header.file_name);
        assert_eq!(lfh.compressed_size, header.compressed_size);
        assert_eq!(lfh.uncompressed_size, header.uncompressed_size);
        assert_eq!(lfh.method, header.method);
    }
}

#[test]
fn compression_selection_law() {
    let archive = build_archive(sample_entries()).unwrap();
    let (_, headers) = read_central_directory(&archive);

    for header in &headers {
        assert!(header.compressed_size <= header.uncompressed_size);
        if header.method == CompressionMethod::Stored {
            assert_eq!(header.compressed_size, header.uncompressed_size);
        }
    }
}

#[test]
fn empty_entry_list_gives_bare_eocd() {
    let archive = build_archive(Vec::new()).unwrap();
    assert_eq!(archive.len(), EndOfCentralDirectory::SIZE);

    let (eocd, headers) = read_central_directory(&archive);
    assert_eq!(eocd.total_entries, 0);
    assert_eq!(eocd.cd_size, 0);
    assert_eq!(eocd.cd_offset, 0);
    assert!(headers.is_empty());
}

#[test]
fn duplicate_entry_names_are_rejected() {
    let result = build_archive(vec![
        ArchiveEntry::new("notes.txt", b"first".to_vec()),
        ArchiveEntry::new("notes.txt", b"second".to_vec()),
    ]);
    assert!(result.is_err());
}

#[test]
fn epub_two_entry_scenario() {
    let opf =
        b"<?xml version=\"1.0\"?><package><metadata><dc:title>Tests</dc:title></metadata></package>";
    let archive = build_archive(vec![
        ArchiveEntry::stored("mimetype", b"application/epub+zip".to_vec()),
        ArchiveEntry::new("OEBPS/content.opf", opf.to_vec()),
    ])
    .unwrap();

    // mimetype must be the entry at offset 0, stored, content verbatim.
    assert_eq!(&archive[0..4], LocalFileHeader::SIGNATURE);
    let mut cursor = Cursor::new(archive.as_slice());
    let first = LocalFileHeader::read_from(&mut cursor).unwrap();
    assert_eq!(first.file_name, "mimetype");
    assert_eq!(first.method, CompressionMethod::Stored);
    let start = cursor.position() as usize;
    assert_eq!(
        &archive[start..start + first.compressed_size as usize],
        b"application/epub+zip"
    );

    let (eocd, headers) = read_central_directory(&archive);
    assert_eq!(eocd.total_entries, 2);
    let names: Vec<&str> = headers.iter().map(|h| h.file_name.as_str()).collect();
    assert_eq!(names, vec!["mimetype", "OEBPS/content.opf"]);

    let (_, recovered_opf) = extract_entry(&archive, &headers[1]);
    assert_eq!(recovered_opf, opf);
}

#[test]
fn builder_output_is_deterministic() {
    let first = build_archive(sample_entries()).unwrap();
    let second = build_archive(sample_entries()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn epub_builder_produces_complete_package() {
    let mut builder = EpubBuilder::new(EpubMetadata::new("Field Notes", "A. Author"));
    builder.add_chapter(Chapter::new("Day One", "<p>It rained.</p>"));
    builder.add_chapter(Chapter::new("Day Two", "<p>It cleared up.</p>"));
    builder.set_stylesheet("body { margin: 1em; }");
    builder.add_resource("cover.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);

    let epub = builder.build().unwrap();
    let (_, headers) = read_central_directory(&epub);
    let names: Vec<&str> = headers.iter().map(|h| h.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "mimetype",
            "META-INF/container.xml",
            "OEBPS/content.opf",
            "OEBPS/nav.xhtml",
            "OEBPS/style.css",
            "OEBPS/chapter1.xhtml",
            "OEBPS/chapter2.xhtml",
            "OEBPS/cover.jpg",
        ]
    );

    // Physical first entry is the stored mimetype.
    let mut cursor = Cursor::new(epub.as_slice());
    let first = LocalFileHeader::read_from(&mut cursor).unwrap();
    assert_eq!(first.file_name, "mimetype");
    assert_eq!(first.method, CompressionMethod::Stored);

    // The JPEG resource stays stored; the container document points the
    // reader at the package document.
    let jpeg = headers.iter().find(|h| h.file_name.ends_with("cover.jpg")).unwrap();
    assert_eq!(jpeg.method, CompressionMethod::Stored);

    let container = headers
        .iter()
        .find(|h| h.file_name == "META-INF/container.xml")
        .unwrap();
    let (_, container_xml) = extract_entry(&epub, container);
    let container_xml = String::from_utf8(container_xml).unwrap();
    assert!(container_xml.contains("full-path=\"OEBPS/content.opf\""));

    let (_, chapter) = extract_entry(&epub, &headers[5]);
    let chapter = String::from_utf8(chapter).unwrap();
    assert!(chapter.contains("<p>It rained.</p>"));
    assert!(chapter.contains("style.css"));
}
