// ============================================================
// Layer 4 — Signal Loader
// ============================================================
// Reads per-class signal columns from a CSV file using the csv
// crate.
//
// File layout:
//   header row  → one name per column (the catalog class keys)
//   data rows   → one numeric reading per cell
//
// Columns may have different lengths: blank cells are skipped,
// so a short column simply stops contributing values. Any other
// cell must parse as a float; a bad cell fails the whole load
// with the column name and the file line it sits on. A row with
// more cells than the header fails the same way.

use anyhow::{bail, Context, Result};
use std::{fs::File, io::Read, path::PathBuf};

use crate::domain::sample::SignalColumns;
use crate::domain::traits::SignalSource;

/// Loads signal columns from a single CSV file.
/// Implements the SignalSource trait from Layer 3.
pub struct CsvSignalLoader {
    path: PathBuf,
}

impl CsvSignalLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SignalSource for CsvSignalLoader {
    fn load_columns(&self) -> Result<SignalColumns> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open signal file '{}'", self.path.display()))?;

        let columns = read_columns(file)
            .with_context(|| format!("Cannot load signal file '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} signal columns ({}) from '{}'",
            columns.len(),
            columns.names().collect::<Vec<_>>().join(", "),
            self.path.display()
        );
        Ok(columns)
    }
}

/// Parse CSV text into named columns, in header order.
pub fn read_columns<R: Read>(reader: R) -> Result<SignalColumns> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Cannot read CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().any(String::is_empty) {
        bail!("CSV header must name every column");
    }

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record.context("Malformed CSV record")?;
        let line   = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > headers.len() {
            bail!(
                "Line {}: {} cells but the header names {} columns",
                line,
                record.len(),
                headers.len()
            );
        }

        for (col, cell) in record.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(v) => values[col].push(v),
                Err(_) => bail!(
                    "Column '{}', line {}: '{}' is not a number",
                    headers[col],
                    line,
                    cell
                ),
            }
        }
    }

    let mut columns = SignalColumns::new();
    for (name, column) in headers.into_iter().zip(values) {
        tracing::debug!("Column '{}': {} readings", name, column.len());
        columns.insert(name, column);
    }
    Ok(columns)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_columns_in_header_order() {
        let file = write_csv("70ml,250ml\n1.0,10\n2.5,20\n3,30\n");
        let columns = CsvSignalLoader::new(file.path()).load_columns().unwrap();

        assert_eq!(columns.names().collect::<Vec<_>>(), vec!["70ml", "250ml"]);
        assert_eq!(columns.get("70ml"), Some(&[1.0, 2.5, 3.0][..]));
        assert_eq!(columns.get("250ml"), Some(&[10.0, 20.0, 30.0][..]));
    }

    #[test]
    fn test_blank_cells_allow_ragged_columns() {
        let file = write_csv("a,b\n1,5\n2,\n3,\n");
        let columns = CsvSignalLoader::new(file.path()).load_columns().unwrap();
        assert_eq!(columns.get("a").map(<[f64]>::len), Some(3));
        assert_eq!(columns.get("b"), Some(&[5.0][..]));
    }

    #[test]
    fn test_non_numeric_cell_names_column_and_line() {
        let file = write_csv("a,b\n1,2\n3,oops\n");
        let err = CsvSignalLoader::new(file.path()).load_columns().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Column 'b'"), "{msg}");
        assert!(msg.contains("line 3"), "{msg}");
    }

    #[test]
    fn test_row_wider_than_header_names_line() {
        let file = write_csv("a,b\n1,2\n3,4,5\n");
        let err = CsvSignalLoader::new(file.path()).load_columns().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Line 3"), "{msg}");
        assert!(msg.contains("3 cells"), "{msg}");
    }

    #[test]
    fn test_short_row_is_not_an_error() {
        let columns = read_columns("a,b\n1,2\n3\n".as_bytes()).unwrap();
        assert_eq!(columns.get("a"), Some(&[1.0, 3.0][..]));
        assert_eq!(columns.get("b"), Some(&[2.0][..]));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = CsvSignalLoader::new(dir.path().join("absent.csv"));
        assert!(loader.load_columns().is_err());
    }
}
