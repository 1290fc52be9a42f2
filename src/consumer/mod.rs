//! Per-record analysis plugged into the pipeline

pub mod builtin;
pub mod extract;
pub mod result;

// Re-export commonly used types
pub use builtin::{RecordLength, TerminatorCheck};
pub use extract::{DataItem, IdentifierExtractor, first_token};
pub use result::{ConsumerResult, PASS_MARKER, current_time};

/// Error raised by a consumer for a single record
pub type ConsumerError = Box<dyn std::error::Error + Send + Sync>;

/// Analysis applied to every record of an archive
///
/// Consumers run concurrently on several worker threads and must not rely on
/// shared mutable state.
pub trait Consumer: Send + Sync + 'static {
    fn consume(&self, record: &str) -> Result<ConsumerResult, ConsumerError>;
}

/// Consumer backed by a closure, see [`from_fn`]
pub struct FnConsumer<F> {
    f: F,
}

/// Wrap a closure as a consumer
///
/// # Example
/// ```rust,ignore
/// let consumer = consumer::from_fn(|record| {
///     Ok(ConsumerResult::new(first_token(record), "length", record.len().to_string()))
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnConsumer<F>
where
    F: Fn(&str) -> Result<ConsumerResult, ConsumerError> + Send + Sync + 'static,
{
    FnConsumer { f }
}

impl<F> Consumer for FnConsumer<F>
where
    F: Fn(&str) -> Result<ConsumerResult, ConsumerError> + Send + Sync + 'static,
{
    fn consume(&self, record: &str) -> Result<ConsumerResult, ConsumerError> {
        (self.f)(record)
    }
}
