//! EPUB3 package assembly.
//!
//! An EPUB is a ZIP archive whose first entry must be an uncompressed file
//! named `mimetype` containing exactly `application/epub+zip`, so readers
//! can sniff the format from the first bytes. [`EpubBuilder`] generates the
//! packaging documents (container.xml, the OPF manifest/spine, the EPUB3
//! navigation document), orders entries correctly, and hands everything to
//! the archive writer.
//!
//! Chapters arrive as ready XHTML body markup; nothing is rendered here.

use anyhow::{Result, bail};

use super::writer::{ArchiveEntry, build_archive};

/// Exact content of the mandatory first entry.
pub const EPUB_MIMETYPE: &[u8] = b"application/epub+zip";

/// Dublin Core metadata carried in the OPF package document.
#[derive(Debug, Clone)]
pub struct EpubMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    pub identifier: String,
}

impl EpubMetadata {
    /// Metadata with `en` language and an identifier derived from the
    /// title. The identifier is deterministic so repeated builds of the
    /// same book are byte-identical.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        let title = title.into();
        let identifier = format!("urn:ruzip:{}", title.replace(' ', "-").to_lowercase());
        Self {
            title,
            author: author.into(),
            language: "en".to_string(),
            identifier,
        }
    }
}

/// One spine item. The body is pre-rendered XHTML markup placed inside
/// `<body>` of the generated chapter document.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub title: String,
    pub body: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// An embedded binary (image, audio, font), placed under `OEBPS/`.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Builder for a complete EPUB3 package.
///
/// ## Example
///
/// ```
/// use ruzip::{Chapter, EpubBuilder, EpubMetadata};
///
/// let mut builder = EpubBuilder::new(EpubMetadata::new("Field Notes", "A. Author"));
/// builder.add_chapter(Chapter::new("Day One", "<p>It rained.</p>"));
/// let epub = builder.build()?;
/// assert_eq!(&epub[30..38], b"mimetype");
/// # anyhow::Ok(())
/// ```
pub struct EpubBuilder {
    metadata: EpubMetadata,
    chapters: Vec<Chapter>,
    resources: Vec<Resource>,
    stylesheet: Option<String>,
}

impl EpubBuilder {
    pub fn new(metadata: EpubMetadata) -> Self {
        Self {
            metadata,
            chapters: Vec::new(),
            resources: Vec::new(),
            stylesheet: None,
        }
    }

    pub fn add_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Add a binary resource. The media type is derived from the file
    /// extension.
    pub fn add_resource(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        let media_type = media_type_for(&name).to_string();
        self.resources.push(Resource {
            name,
            data,
            media_type,
        });
    }

    /// CSS applied to every generated chapter document.
    pub fn set_stylesheet(&mut self, css: impl Into<String>) {
        self.stylesheet = Some(css.into());
    }

    /// Assemble the package and serialize it to EPUB bytes.
    ///
    /// Entry order: `mimetype` (stored), `META-INF/container.xml`,
    /// `OEBPS/content.opf`, `OEBPS/nav.xhtml`, the stylesheet, one XHTML
    /// file per chapter, then resources. Text entries are compressible;
    /// resources in already-dense formats are stored verbatim.
    pub fn build(self) -> Result<Vec<u8>> {
        if self.chapters.is_empty() {
            bail!("An EPUB needs at least one chapter");
        }

        let mut entries = vec![
            ArchiveEntry::stored("mimetype", EPUB_MIMETYPE.to_vec()),
            ArchiveEntry::new("META-INF/container.xml", container_xml().into_bytes()),
            ArchiveEntry::new("OEBPS/content.opf", self.content_opf().into_bytes()),
            ArchiveEntry::new("OEBPS/nav.xhtml", self.nav_xhtml().into_bytes()),
        ];

        if let Some(css) = &self.stylesheet {
            entries.push(ArchiveEntry::new(
                "OEBPS/style.css",
                css.clone().into_bytes(),
            ));
        }

        for (i, chapter) in self.chapters.iter().enumerate() {
            entries.push(ArchiveEntry::new(
                format!("OEBPS/{}", chapter_href(i)),
                self.chapter_xhtml(chapter).into_bytes(),
            ));
        }

        for resource in &self.resources {
            let name = format!("OEBPS/{}", resource.name);
            let entry = if is_dense_media(&resource.media_type) {
                ArchiveEntry::stored(name, resource.data.clone())
            } else {
                ArchiveEntry::new(name, resource.data.clone())
            };
            entries.push(entry);
        }

        build_archive(entries)
    }

    fn content_opf(&self) -> String {
        let mut manifest = String::new();
        manifest.push_str(
            "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        );
        if self.stylesheet.is_some() {
            manifest.push_str("    <item id=\"css\" href=\"style.css\" media-type=\"text/css\"/>\n");
        }
        for i in 0..self.chapters.len() {
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                chapter_id(i),
                chapter_href(i),
            ));
        }
        for (i, resource) in self.resources.iter().enumerate() {
            manifest.push_str(&format!(
                "    <item id=\"res{}\" href=\"{}\" media-type=\"{}\"/>\n",
                i + 1,
                xml_escape(&resource.name),
                xml_escape(&resource.media_type),
            ));
        }

        let mut spine = String::new();
        for i in 0..self.chapters.len() {
            spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter_id(i)));
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\" unique-identifier=\"pub-id\">\n\
             \x20 <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n\
             \x20   <dc:identifier id=\"pub-id\">{identifier}</dc:identifier>\n\
             \x20   <dc:title>{title}</dc:title>\n\
             \x20   <dc:creator>{author}</dc:creator>\n\
             \x20   <dc:language>{language}</dc:language>\n\
             \x20 </metadata>\n\
             \x20 <manifest>\n\
             {manifest}\
             \x20 </manifest>\n\
             \x20 <spine>\n\
             {spine}\
             \x20 </spine>\n\
             </package>\n",
            identifier = xml_escape(&self.metadata.identifier),
            title = xml_escape(&self.metadata.title),
            author = xml_escape(&self.metadata.author),
            language = xml_escape(&self.metadata.language),
        )
    }

    fn nav_xhtml(&self) -> String {
        let mut items = String::new();
        for (i, chapter) in self.chapters.iter().enumerate() {
            items.push_str(&format!(
                "        <li><a href=\"{}\">{}</a></li>\n",
                chapter_href(i),
                xml_escape(&chapter.title),
            ));
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <!DOCTYPE html>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n\
             <head>\n\
             \x20 <title>{title}</title>\n\
             </head>\n\
             <body>\n\
             \x20 <nav epub:type=\"toc\">\n\
             \x20   <h1>Contents</h1>\n\
             \x20   <ol>\n\
             {items}\
             \x20   </ol>\n\
             \x20 </nav>\n\
             </body>\n\
             </html>\n",
            title = xml_escape(&self.metadata.title),
        )
    }

    fn chapter_xhtml(&self, chapter: &Chapter) -> String {
        let css_link = if self.stylesheet.is_some() {
            "\n  <link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\"/>"
        } else {
            ""
        };

        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <!DOCTYPE html>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
             <head>\n\
             \x20 <title>{title}</title>{css_link}\n\
             </head>\n\
             <body>\n\
             {body}\n\
             </body>\n\
             </html>\n",
            title = xml_escape(&chapter.title),
            body = chapter.body,
        )
    }
}

/// Move an existing `mimetype` entry to the front (forcing it stored), or
/// insert the canonical one if the list has none. Raw entry lists headed
/// for a `.epub` file must satisfy the reader sniffing contract even when
/// the caller supplied entries in arbitrary order.
pub fn ensure_mimetype_first(entries: &mut Vec<ArchiveEntry>) {
    if let Some(pos) = entries.iter().position(|e| e.name == "mimetype") {
        let mut entry = entries.remove(pos);
        entry.compress = false;
        entries.insert(0, entry);
    } else {
        entries.insert(0, ArchiveEntry::stored("mimetype", EPUB_MIMETYPE.to_vec()));
    }
}

/// The OCF container document pointing readers at the package document.
fn container_xml() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
     <container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n\
     \x20 <rootfiles>\n\
     \x20   <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n\
     \x20 </rootfiles>\n\
     </container>\n"
        .to_string()
}

fn chapter_id(index: usize) -> String {
    format!("chapter{}", index + 1)
}

fn chapter_href(index: usize) -> String {
    format!("chapter{}.xhtml", index + 1)
}

/// Media type by file extension, for the OPF manifest.
pub fn media_type_for(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "xhtml" | "html" | "htm" => "application/xhtml+xml",
        "css" => "text/css",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Formats whose encodings are already dense; DEFLATE only adds overhead.
fn is_dense_media(media_type: &str) -> bool {
    match media_type {
        "image/svg+xml" => false,
        t => {
            t.starts_with("image/")
                || t.starts_with("audio/")
                || t.starts_with("video/")
                || t == "font/woff"
                || t == "font/woff2"
        }
    }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_builder() -> EpubBuilder {
        let mut builder = EpubBuilder::new(EpubMetadata::new("Notes & Sketches", "J. Doe"));
        builder.add_chapter(Chapter::new("First", "<p>one</p>"));
        builder.add_chapter(Chapter::new("Second", "<p>two</p>"));
        builder
    }

    #[test]
    fn xml_escape_covers_markup_characters() {
        assert_eq!(xml_escape("a & b < c > \"d\""), "a &amp; b &lt; c &gt; &quot;d&quot;");
        assert_eq!(xml_escape("plain"), "plain");
    }

    #[test]
    fn opf_contains_escaped_metadata_and_spine_order() {
        let builder = basic_builder();
        let opf = builder.content_opf();

        assert!(opf.contains("<dc:title>Notes &amp; Sketches</dc:title>"));
        assert!(opf.contains("<dc:creator>J. Doe</dc:creator>"));
        let first = opf.find("<itemref idref=\"chapter1\"/>").unwrap();
        let second = opf.find("<itemref idref=\"chapter2\"/>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn manifest_lists_every_chapter_and_resource_once() {
        let mut builder = basic_builder();
        builder.add_resource("cover.jpg", vec![0xFF, 0xD8, 0xFF]);
        let opf = builder.content_opf();

        assert_eq!(opf.matches("href=\"chapter1.xhtml\"").count(), 1);
        assert_eq!(opf.matches("href=\"chapter2.xhtml\"").count(), 1);
        assert_eq!(
            opf.matches("href=\"cover.jpg\" media-type=\"image/jpeg\"").count(),
            1
        );
    }

    #[test]
    fn nav_lists_chapters_in_order() {
        let builder = basic_builder();
        let nav = builder.nav_xhtml();
        let first = nav.find(">First</a>").unwrap();
        let second = nav.find(">Second</a>").unwrap();
        assert!(first < second);
        assert!(nav.contains("epub:type=\"toc\""));
    }

    #[test]
    fn build_puts_stored_mimetype_first() {
        let epub = basic_builder().build().unwrap();
        // Offset 0 holds the mimetype local header; the literal content
        // follows the 30-byte header and 8-byte name, uncompressed.
        assert_eq!(&epub[30..38], b"mimetype");
        assert_eq!(&epub[38..58], EPUB_MIMETYPE);
    }

    #[test]
    fn build_requires_a_chapter() {
        let builder = EpubBuilder::new(EpubMetadata::new("Empty", "Nobody"));
        assert!(builder.build().is_err());
    }

    #[test]
    fn media_types_by_extension() {
        assert_eq!(media_type_for("img/cover.JPG"), "image/jpeg");
        assert_eq!(media_type_for("style.css"), "text/css");
        assert_eq!(media_type_for("voice.m4a"), "audio/mp4");
        assert_eq!(media_type_for("mystery"), "application/octet-stream");
    }

    #[test]
    fn dense_media_is_not_compressed() {
        assert!(is_dense_media("image/png"));
        assert!(is_dense_media("audio/mpeg"));
        assert!(!is_dense_media("image/svg+xml"));
        assert!(!is_dense_media("text/css"));
    }

    #[test]
    fn ensure_mimetype_first_moves_and_stores() {
        let mut entries = vec![
            ArchiveEntry::new("OEBPS/a.xhtml", b"<p/>".to_vec()),
            ArchiveEntry::new("mimetype", EPUB_MIMETYPE.to_vec()),
        ];
        ensure_mimetype_first(&mut entries);
        assert_eq!(entries[0].name, "mimetype");
        assert!(!entries[0].compress);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn ensure_mimetype_first_inserts_when_missing() {
        let mut entries = vec![ArchiveEntry::new("OEBPS/a.xhtml", b"<p/>".to_vec())];
        ensure_mimetype_first(&mut entries);
        assert_eq!(entries[0].name, "mimetype");
        assert_eq!(entries[0].payload, EPUB_MIMETYPE);
        assert_eq!(entries.len(), 2);
    }
}
