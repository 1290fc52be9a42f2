use crate::archive::DEFAULT_TERMINATOR;

/// Worker count used when none is configured
pub const DEFAULT_WORKERS: usize = 8;

/// Largest channel bound handed to tokio
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Pipeline tuning knobs, fixed for the lifetime of a run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    workers: usize,
    queue_capacity: Option<usize>,
    terminator: String,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: None,
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }

    /// Set number of parallel workers (at least 1)
    ///
    /// # Example
    /// ```rust,ignore
    /// // One worker per CPU core
    /// PipelineConfig::new().with_workers(num_cpus)
    /// ```
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bound of the work queue and of the result channel (at least 1, at
    /// most [`MAX_QUEUE_CAPACITY`])
    ///
    /// Defaults to twice the worker count. Together with the worker count
    /// this bounds how many records are held in memory at once.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity.max(1));
        self
    }

    /// Line that terminates a record
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| self.workers.saturating_mul(2))
            .min(MAX_QUEUE_CAPACITY)
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
