use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ruzip")]
#[command(version)]
#[command(about = "A Rust zip utility for packaging ZIP archives and EPUB e-books", long_about = None)]
#[command(after_help = "Examples:\n  \
  ruzip notes.zip notes/               pack the notes directory into notes.zip\n  \
  ruzip book.epub book/                pack an unpacked EPUB tree, mimetype first\n  \
  ruzip -0 media.zip voice.m4a         store inputs without trying to compress\n  \
  ruzip --title 'Field Notes' book.epub ch1.xhtml ch2.xhtml cover.jpg\n  \
                                       compose an EPUB from chapters and media")]
pub struct Cli {
    /// Output archive path (.zip or .epub)
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Files or directories to pack
    #[arg(value_name = "FILES")]
    pub inputs: Vec<String>,

    /// Store everything, never attempt compression
    #[arg(short = '0')]
    pub store_only: bool,

    /// Junk paths (strip directory components from entry names)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Overwrite an existing archive WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Treat the output as an EPUB even without the .epub extension
    #[arg(long)]
    pub epub: bool,

    /// Compose an EPUB: inputs become chapters/resources of a new book
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Author for --title mode
    #[arg(long, value_name = "AUTHOR", default_value = "Unknown")]
    pub author: String,

    /// Language for --title mode
    #[arg(long, value_name = "LANG", default_value = "en")]
    pub language: String,
}

impl Cli {
    pub fn is_epub_output(&self) -> bool {
        self.epub || self.title.is_some() || self.archive.ends_with(".epub")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
