use std::io;
use thiserror::Error;

/// Storage-level errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Store is read-only: {0}")]
    ReadOnly(String),

    #[error("Corrupt store {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        assert_eq!(
            StorageError::DuplicateIdentifier("2244".to_string()).to_string(),
            "Duplicate identifier: 2244"
        );
        assert_eq!(
            StorageError::ReadOnly("ref.csv".to_string()).to_string(),
            "Store is read-only: ref.csv"
        );
        assert_eq!(
            StorageError::Corrupt {
                path: "ref.csv".to_string(),
                reason: "unexpected header".to_string(),
            }
            .to_string(),
            "Corrupt store ref.csv: unexpected header"
        );
    }

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let storage_err = StorageError::from(io_err);

        match storage_err {
            StorageError::IoError(_) => {}
            _ => panic!("Expected IoError variant"),
        }
    }
}
