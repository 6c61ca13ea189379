//! File ingestion: uploaded CSV or PDF statement → raw transactions
//!
//! CSV input is split on bare commas with no quoting support. Quoted fields
//! containing commas are not recognized and shift the remaining columns.
//!
//! Both paths also produce `spending_data`, the `Date,Description,Amount`
//! text later handed to the savings-tip capability.

use std::path::Path;

use base64::Engine;
use tracing::{debug, info};

use crate::ai::{InferenceBackend, InferenceGateway};
use crate::error::{Error, Result};
use crate::models::RawTransaction;

pub const MIME_CSV: &str = "text/csv";
pub const MIME_PDF: &str = "application/pdf";

/// Columns every CSV header must contain
pub const REQUIRED_COLUMNS: [&str; 3] = ["Date", "Description", "Amount"];

/// Keys the annotated transaction adds next to the CSV columns
const RESERVED_COLUMNS: [&str; 3] = ["Category", "isAnomalous", "anomalyReason"];

/// An uploaded file with its declared MIME type
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: Option<String>,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(mime_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a file from disk, inferring the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        let mut file = Self::new(mime_type_for_path(path), content);
        file.name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(file)
    }
}

/// Best-effort MIME type from a file name extension
pub fn mime_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => MIME_CSV,
        Some("pdf") => MIME_PDF,
        _ => "application/octet-stream",
    }
}

/// Result of ingesting one file
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedFile {
    pub transactions: Vec<RawTransaction>,
    /// CSV-like text representation passed to the savings-tip capability
    pub spending_data: String,
}

/// The declared file kind, decided before any content is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Pdf,
}

fn file_kind(mime_type: &str) -> Result<FileKind> {
    // Ignore parameters such as "; charset=utf-8"
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        MIME_CSV => Ok(FileKind::Csv),
        MIME_PDF => Ok(FileKind::Pdf),
        _ => Err(Error::UnsupportedFileType(mime_type.to_string())),
    }
}

/// Turn an uploaded file into raw transactions
///
/// Unsupported types fail before any remote call. PDF documents are handed to
/// the document extraction capability as a base64 data URI.
pub async fn ingest<B: InferenceBackend>(
    file: &UploadedFile,
    gateway: &InferenceGateway<B>,
) -> Result<IngestedFile> {
    let ingested = match file_kind(&file.mime_type)? {
        FileKind::Csv => {
            let text = String::from_utf8_lossy(&file.content);
            let text = text.trim_start_matches('\u{feff}');
            let transactions = parse_csv(text)?;
            IngestedFile {
                transactions,
                spending_data: text.to_string(),
            }
        }
        FileKind::Pdf => {
            let data_uri = pdf_data_uri(&file.content);
            debug!(bytes = file.content.len(), "Extracting transactions from PDF");
            let transactions = gateway.extract_from_document(&data_uri).await?;
            let spending_data = spending_data_from(&transactions);
            IngestedFile {
                transactions,
                spending_data,
            }
        }
    };

    if ingested.transactions.is_empty() {
        return Err(Error::NoTransactionsFound);
    }

    info!(
        file = file.name.as_deref().unwrap_or("<upload>"),
        mime = %file.mime_type,
        transactions = ingested.transactions.len(),
        "Ingested file"
    );
    Ok(ingested)
}

/// Parse CSV text with a header row into raw transactions
///
/// Each data line maps positionally onto the trimmed header names. The
/// `Amount` column is parsed as a number, all other columns stay strings and
/// anything beyond Date/Description/Amount lands in `extra`. Blank lines are
/// skipped. Fields past the last header are ignored.
pub fn parse_csv(text: &str) -> Result<Vec<RawTransaction>> {
    let mut lines = text
        .trim()
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Ok(Vec::new());
    };

    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();
    for required in REQUIRED_COLUMNS {
        if !headers.contains(&required) {
            return Err(Error::InvalidCsv(format!(
                "header is missing required column '{}'",
                required
            )));
        }
    }

    let columns = passthrough_names(&headers);

    let mut transactions = Vec::new();
    for (line_idx, line) in lines {
        let line_no = line_idx + 1;
        let values: Vec<&str> = line.split(',').collect();
        if values.len() < headers.len() {
            return Err(Error::InvalidCsv(format!(
                "line {}: expected {} fields, found {}",
                line_no,
                headers.len(),
                values.len()
            )));
        }

        let mut tx = RawTransaction::new("", "", 0.0);
        for ((header, column), value) in headers
            .iter()
            .zip(&columns)
            .zip(values.iter().map(|v| v.trim()))
        {
            match *header {
                "Amount" => {
                    tx.amount = value
                        .parse::<f64>()
                        .ok()
                        .filter(|a| a.is_finite())
                        .ok_or_else(|| {
                            Error::InvalidCsv(format!(
                                "line {}: invalid Amount '{}'",
                                line_no, value
                            ))
                        })?;
                }
                "Date" => tx.date = value.to_string(),
                "Description" => tx.description = value.to_string(),
                _ => {
                    tx.extra.insert(column.clone(), value.to_string());
                }
            }
        }
        transactions.push(tx);
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Names under which extra columns are carried
///
/// A column that would clash with a key added later in the pipeline is
/// renamed `Source <name>`, prefixed again until the name is free.
fn passthrough_names(headers: &[&str]) -> Vec<String> {
    headers
        .iter()
        .map(|header| {
            let mut name = header.to_string();
            while RESERVED_COLUMNS.contains(&name.as_str())
                || (name != *header && headers.contains(&name.as_str()))
            {
                name = format!("Source {}", name);
            }
            if name != *header {
                debug!(column = %header, renamed = %name, "Renamed CSV column");
            }
            name
        })
        .collect()
}

/// Encode PDF bytes as a `data:application/pdf;base64,...` URI
pub fn pdf_data_uri(content: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        MIME_PDF,
        base64::engine::general_purpose::STANDARD.encode(content)
    )
}

/// Synthetic `Date,Description,Amount` text for transactions that did not
/// come from a CSV file. Fields are joined verbatim.
pub fn spending_data_from(transactions: &[RawTransaction]) -> String {
    let mut out = String::from("Date,Description,Amount");
    for tx in transactions {
        out.push('\n');
        out.push_str(&format!("{},{},{}", tx.date, tx.description, tx.amount));
    }
    out
}
