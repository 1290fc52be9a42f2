pub mod csv_store;
pub mod error;
pub mod memory;
pub mod traits;

use std::path::Path;

// Re-export commonly used types
pub use csv_store::CsvResultStore;
pub use error::StorageError;
pub use memory::MemoryResultStore;
pub use traits::ResultStore;

/// Destination naming an ephemeral in-memory store
pub const MEMORY_DESTINATION: &str = ":memory:";

/// Open a writable store: `:memory:` or a CSV file path
pub fn open_store(destination: &str) -> Result<Box<dyn ResultStore>, StorageError> {
    if destination == MEMORY_DESTINATION {
        return Ok(Box::new(MemoryResultStore::new()));
    }
    Ok(Box::new(CsvResultStore::open(Path::new(destination))?))
}
