mod local;

pub use local::{collect_entries, is_precompressed};
