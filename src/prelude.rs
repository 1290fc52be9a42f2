//! Prelude module for convenient imports
//!
//! Import everything you need with: `use sdfcheck::prelude::*;`

// Archive types
pub use crate::archive::{DEFAULT_TERMINATOR, RecordReader};

// Consumer types
pub use crate::consumer::{
    Consumer, ConsumerError, ConsumerResult, DataItem, IdentifierExtractor, PASS_MARKER,
    RecordLength, TerminatorCheck, first_token, from_fn,
};

// Pipeline types
pub use crate::pipeline::{DEFAULT_WORKERS, Pipeline, PipelineConfig, PipelineError, ResultStream};

// Storage types
pub use crate::storage::{
    CsvResultStore, MEMORY_DESTINATION, MemoryResultStore, ResultStore, StorageError, open_store,
};

// Driver types
pub use crate::driver::{
    CollectingReporter, Driver, DriverError, FailureDetail, FailureEntry, FailureReporter,
    SilentReporter, TracingReporter, Verdict,
};

// App types
pub use crate::app::{AppError, Cli, CliApp, RunOptions, execute};
