//! Built-in sample statement for trying the dashboard without a file

use crate::ingest::{UploadedFile, MIME_CSV};

pub const SAMPLE_FILE_NAME: &str = "sample-transactions.csv";

/// One month of everyday transactions
pub const SAMPLE_TRANSACTIONS_CSV: &str = include_str!("../../../data/sample-transactions.csv");

pub fn sample_upload() -> UploadedFile {
    UploadedFile::new(MIME_CSV, SAMPLE_TRANSACTIONS_CSV).with_name(SAMPLE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv;

    #[test]
    fn test_sample_parses() {
        let txs = parse_csv(SAMPLE_TRANSACTIONS_CSV).unwrap();
        assert!(txs.len() >= 30);
        assert!(txs.iter().all(|t| t.amount.is_finite()));
    }

    #[test]
    fn test_sample_upload() {
        let file = sample_upload();
        assert_eq!(file.mime_type, "text/csv");
        assert_eq!(file.name.as_deref(), Some("sample-transactions.csv"));
        assert!(file.content.starts_with(b"Date,Description,Amount"));
    }
}
