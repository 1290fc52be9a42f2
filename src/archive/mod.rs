pub mod reader;

// Re-export commonly used types
pub use reader::{DEFAULT_TERMINATOR, GzipLines, RecordReader};
