use std::path::Path;

use crate::pipeline::PipelineError;

/// Probe order for the positional feed. Semicolon is the primary layout the
/// legacy exporter produces.
pub(crate) const DELIMITERS: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Raw positional table before any column mapping.
#[derive(Debug)]
pub(crate) struct RawTable {
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

pub(crate) fn read_table(path: &Path) -> Result<RawTable, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| {
        PipelineError::source_read_io(format!("WOQ feed {} not readable", path.display()), source)
    })?;
    if bytes.is_empty() {
        return Err(PipelineError::source_read(format!(
            "WOQ feed {} is empty",
            path.display()
        )));
    }
    parse_bytes(&bytes)
}

/// Decodes the bytes and probes delimiters until one yields at least two
/// columns; otherwise the primary delimiter's parse is kept. Zero usable rows
/// is an error, an odd-but-parsable file is not.
pub(crate) fn parse_bytes(bytes: &[u8]) -> Result<RawTable, PipelineError> {
    let text = decode(bytes);

    let mut primary: Option<RawTable> = None;
    for delimiter in DELIMITERS {
        let rows = split_rows(&text, delimiter)?;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width > 1 {
            return Ok(RawTable { rows, delimiter });
        }
        if primary.is_none() {
            primary = Some(RawTable { rows, delimiter });
        }
    }

    let table = primary.unwrap_or(RawTable {
        rows: Vec::new(),
        delimiter: DELIMITERS[0],
    });
    if table.rows.is_empty() || table.rows.iter().all(|row| row.is_empty()) {
        return Err(PipelineError::source_read(
            "WOQ feed parsed to zero rows or columns".to_string(),
        ));
    }
    Ok(table)
}

/// The legacy exporter writes Latin-1; anything that is not valid UTF-8 is
/// decoded byte-for-byte.
fn decode(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };
    text.strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or(text)
}

fn split_rows(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_is_tried_first() {
        let table = parse_bytes(b"a;b;c\nd;e;f\n").expect("parses");
        assert_eq!(table.delimiter, b';');
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["a", "b", "c"]);
    }

    #[test]
    fn falls_through_to_comma_and_tab_and_pipe() {
        assert_eq!(parse_bytes(b"a,b\nc,d\n").expect("comma").delimiter, b',');
        assert_eq!(parse_bytes(b"a\tb\n").expect("tab").delimiter, b'\t');
        assert_eq!(parse_bytes(b"a|b\n").expect("pipe").delimiter, b'|');
    }

    #[test]
    fn single_column_keeps_primary_delimiter() {
        let table = parse_bytes(b"solo\nrow\n").expect("parses");
        assert_eq!(table.delimiter, b';');
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["solo"]);
    }

    #[test]
    fn latin1_bytes_decode() {
        // "SÍ" in Latin-1: 0x53 0xCD.
        let table = parse_bytes(&[0x53, 0xCD, b';', b'x', b'\n']).expect("parses");
        assert_eq!(table.rows[0][0], "SÍ");
    }

    #[test]
    fn blank_input_is_an_error() {
        let error = parse_bytes(b"\n\n").expect_err("no rows");
        assert!(matches!(error, PipelineError::SourceRead { .. }));
    }
}
