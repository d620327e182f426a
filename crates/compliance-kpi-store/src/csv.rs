// crates/compliance-kpi-store/src/csv.rs
// ============================================================================
// Module: Delimited Text Codec
// Description: Minimal comma-separated record reader.
// Purpose: Split control sheets into records with quote handling.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Reads comma-separated text into records. Quoted fields may contain commas,
//! doubled quotes, and line breaks. A leading UTF-8 byte order mark is
//! ignored and blank lines are skipped. Each record remembers the line it
//! started on so callers can report precise locations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Delimited text parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct CsvError {
    /// One-based line number where the failure was detected.
    pub line: usize,
    /// Failure description.
    pub reason: String,
}

/// One parsed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// One-based line number the record starts on.
    pub line: usize,
    /// Field values with quoting removed.
    pub fields: Vec<String>,
}

impl CsvRecord {
    /// Returns true when every field is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.trim().is_empty())
    }
}

/// Field scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the start of a field.
    FieldStart,
    /// Inside an unquoted field.
    Unquoted,
    /// Inside a quoted field.
    Quoted,
    /// Just read a quote inside a quoted field.
    QuoteInQuoted,
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses comma-separated text into non-blank records.
///
/// # Errors
///
/// Returns [`CsvError`] for an unterminated quoted field or stray text after
/// a closing quote.
pub fn parse_records(text: &str) -> Result<Vec<CsvRecord>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::FieldStart;
    let mut line = 1_usize;
    let mut record_line = 1_usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match (state, ch) {
            (State::Quoted, '"') => state = State::QuoteInQuoted,
            (State::Quoted, other) => {
                if other == '\n' {
                    line += 1;
                }
                field.push(other);
            }
            (State::QuoteInQuoted, '"') => {
                field.push('"');
                state = State::Quoted;
            }
            (State::FieldStart, '"') => state = State::Quoted,
            (_, ',') => {
                fields.push(std::mem::take(&mut field));
                state = State::FieldStart;
            }
            (_, '\r') if chars.peek() == Some(&'\n') => {}
            (_, '\n' | '\r') => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
                state = State::FieldStart;
            }
            (State::QuoteInQuoted, other) => {
                return Err(CsvError {
                    line,
                    reason: format!("unexpected {other:?} after closing quote"),
                });
            }
            (State::FieldStart | State::Unquoted, other) => {
                field.push(other);
                state = State::Unquoted;
            }
        }
    }

    if state == State::Quoted {
        return Err(CsvError {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !fields.is_empty() || !field.is_empty() || state == State::QuoteInQuoted {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }
    Ok(records)
}

/// Appends a record unless it is blank.
fn push_record(records: &mut Vec<CsvRecord>, line: usize, fields: Vec<String>) {
    let record = CsvRecord {
        line,
        fields,
    };
    if !record.is_blank() {
        records.push(record);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::parse_records;

    fn fields(text: &str) -> Vec<Vec<String>> {
        parse_records(text).unwrap().into_iter().map(|record| record.fields).collect()
    }

    #[test]
    fn splits_plain_and_quoted_fields() {
        let parsed = fields("id,\"Score, %\"\r\nA-1,\"say \"\"hi\"\"\"\n");
        assert_eq!(parsed, vec![vec!["id", "Score, %"], vec!["A-1", "say \"hi\""]]);
    }

    #[test]
    fn quoted_fields_may_span_lines() {
        let records = parse_records("note,score\n\"two\nlines\",80\nlast,90").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].fields, vec!["two\nlines", "80"]);
        assert_eq!(records[2].line, 4);
    }

    #[test]
    fn skips_bom_and_blank_lines() {
        let parsed = fields("\u{feff}a,b\n\n , \n1,2\n");
        assert_eq!(parsed, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn keeps_trailing_empty_field() {
        assert_eq!(fields("a,\n"), vec![vec!["a", ""]]);
    }

    #[test]
    fn rejects_unterminated_quote() {
        let err = parse_records("a\n\"open,1\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn rejects_text_after_closing_quote() {
        assert!(parse_records("\"a\"b,1").is_err());
    }
}
