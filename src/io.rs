//! Reading input tables from disk and writing the summary.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::error::{FootprintError, Result};

/// Read a table from a `.csv` or `.parquet` file.
///
/// CSV files are read with every column as String; column names are
/// trimmed. `rename` maps source column names onto the names in
/// [`crate::schema`], e.g. `"Item" -> "item"` for a raw FAOSTAT export.
pub fn read_table(path: &Path, rename: Option<&HashMap<String, String>>) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let df = match extension.as_deref() {
        Some("csv") => read_csv_as_strings(path)?,
        Some("parquet") => ParquetReader::new(File::open(path)?).finish()?,
        _ => {
            return Err(FootprintError::InvalidData(format!(
                "unsupported table format: {}",
                path.display()
            )))
        }
    };
    debug!(path = %path.display(), rows = df.height(), "read table");

    match rename {
        Some(map) if !map.is_empty() => rename_columns(df, map),
        _ => Ok(df),
    }
}

/// Read a CSV file with all columns as String dtype and trimmed headers.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// Rename the columns named in `map` that exist in `df`.
pub fn rename_columns(df: DataFrame, map: &HashMap<String, String>) -> Result<DataFrame> {
    let present: Vec<(&str, &str)> = map
        .iter()
        .filter(|(old, _)| df.column(old.as_str()).is_ok())
        .map(|(old, new)| (old.as_str(), new.as_str()))
        .collect();
    if present.is_empty() {
        return Ok(df);
    }
    let old: Vec<&str> = present.iter().map(|(o, _)| *o).collect();
    let new: Vec<&str> = present.iter().map(|(_, n)| *n).collect();
    Ok(df.lazy().rename(old, new, true).collect()?)
}

/// Write a table as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    debug!(path = %path.display(), rows = df.height(), "wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_trims_headers_and_keeps_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, " exporter ,commodity, weight").unwrap();
        writeln!(file, "Canada,Wheat,12.5").unwrap();
        drop(file);

        let df = read_table(&path, None).unwrap();

        assert_eq!(df.get_column_names_str(), vec!["exporter", "commodity", "weight"]);
        assert_eq!(df.column("weight").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_read_with_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fbs.csv");
        std::fs::write(&path, "Area,Item,Element,Value\nBrazil,Wheat,Production,1\n").unwrap();
        let rename: HashMap<String, String> = [("Area", "area"), ("Item", "item"), ("Missing", "x")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();

        let df = read_table(&path, Some(&rename)).unwrap();

        assert!(df.column("area").is_ok());
        assert!(df.column("item").is_ok());
        assert!(df.column("Element").is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = read_table(Path::new("inputs/fbs.xlsx"), None);
        assert!(matches!(result, Err(FootprintError::InvalidData(_))));
    }

    #[test]
    fn test_write_csv_roundtrip_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let mut df = df! {
            "item" => &["Wheat"],
            "total_impact" => &[1.5],
        }
        .unwrap();

        write_csv(&mut df, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("item,total_impact"));
    }
}
