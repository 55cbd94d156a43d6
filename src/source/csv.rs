//! CSV source reader

use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::CsvRow;
use tracing::debug;

/// Reads a CSV document from a URL
#[derive(Debug, Clone)]
pub struct CsvSource {
    client: HttpClient,
}

impl CsvSource {
    /// Create a reader on a shared client
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch and parse the document at `url`
    pub async fn read(&self, url: &str) -> Result<Vec<CsvRow>> {
        let body = self
            .client
            .get_text(url, RequestConfig::new().header("Accept", "text/csv"))
            .await
            .map_err(|e| e.for_source(url))?;

        let rows = parse_csv(&body);
        debug!(url, rows = rows.len(), "parsed CSV");
        Ok(rows)
    }
}

/// Parse CSV text into header-keyed rows
///
/// Blank lines are skipped and the first remaining line is the header. Short
/// rows are padded with empty strings; anything past the header width is
/// ignored. Fewer than two non-blank lines gives no rows.
pub fn parse_csv(text: &str) -> Vec<CsvRow> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.lines().filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers = parse_csv_line(header_line);

    lines
        .map(|line| {
            let mut fields = parse_csv_line(line).into_iter();
            headers
                .iter()
                .map(|header| (header.clone(), fields.next().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Split one CSV line into trimmed fields
///
/// Quoted fields may contain commas; `""` inside quotes is a literal quote.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
            }
        } else if c == ',' && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}
