//! Parallel regression and invariance testing over compressed SD archives
//!
//! An archive is split into records, every record is handed to a
//! [`consumer::Consumer`] on a pool of workers, and the results are checked by
//! one of the [`driver`] protocols against a [`storage::ResultStore`].

pub mod app;
pub mod archive;
pub mod consumer;
pub mod driver;
pub mod pipeline;
pub mod prelude;
pub mod storage;
