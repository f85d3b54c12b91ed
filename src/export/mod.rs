// src/export/mod.rs
pub mod columnar;

use csv::WriterBuilder;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{Error, Result};
use crate::usage::UsageRecord;

pub use columnar::export_parquet;

/// Write `records` as CSV: header row, then every original column of each row.
pub fn write_csv<W: Write>(headers: &[String], records: &[&UsageRecord], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(headers)?;
    for r in records {
        wtr.write_record(&r.raw)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export the filtered view to a CSV file at `path`.
pub fn export_csv(headers: &[String], records: &[&UsageRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(headers, records, file)?;
    info!(path = %path.display(), rows = records.len(), "exported CSV");
    Ok(())
}

/// Copy the raw source spreadsheet into `dest_dir`, keeping its file name.
pub fn copy_source(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !src.is_file() {
        return Err(Error::FileNotFound(src.to_path_buf()));
    }
    let name = src
        .file_name()
        .ok_or_else(|| Error::FileNotFound(src.to_path_buf()))?;
    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(name);
    let bytes = fs::copy(src, &dest)?;
    info!(dest = %dest.display(), bytes, "copied source spreadsheet");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::read_csv;
    use crate::usage::tests::sample_table;
    use crate::usage::{apply, FilterSelection};
    use tempfile::tempdir;

    #[test]
    fn csv_round_trips_original_columns() -> Result<()> {
        let table = sample_table();
        let view = apply(&table, &FilterSelection::with_tools(["fc"]))?;
        let mut buf = Vec::new();
        write_csv(view.headers, &view.records, &mut buf)?;

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Username,Full Name,tool,Date"));
        assert_eq!(text.lines().count(), 2);

        let back = read_csv(text.as_bytes())?;
        assert_eq!(back.headers, table.headers);
        assert_eq!(back.get(0, "tool"), Some("fc"));
        Ok(())
    }

    #[test]
    fn values_with_commas_are_quoted() -> Result<()> {
        let sheet = read_csv("Username,tool\n\"Doe, Jane\",vcs\n".as_bytes())?;
        let rec = UsageRecord {
            username: Some("Doe, Jane".into()),
            full_name: None,
            email: None,
            tool: Some("vcs".into()),
            date: None,
            iso_year: None,
            week_label: None,
            rating: crate::usage::FeedbackRating::None,
            comment: None,
            mgmt_chain: Vec::new(),
            raw: sheet.rows[0].clone(),
        };
        let mut buf = Vec::new();
        write_csv(&sheet.headers, &[&rec], &mut buf)?;
        assert_eq!(String::from_utf8(buf).unwrap(), "Username,tool\n\"Doe, Jane\",vcs\n");
        Ok(())
    }

    #[test]
    fn export_and_copy_write_files() -> Result<()> {
        let dir = tempdir()?;
        let table = sample_table();
        let all: Vec<&UsageRecord> = table.records.iter().collect();
        let out = dir.path().join("nested").join("filtered_data.csv");
        export_csv(&table.headers, &all, &out)?;
        assert!(out.is_file());

        let copied = copy_source(&out, &dir.path().join("downloads"))?;
        assert_eq!(copied.file_name().unwrap(), "filtered_data.csv");
        assert_eq!(fs::read(&copied)?, fs::read(&out)?);

        let missing = copy_source(&dir.path().join("nope.xlsx"), dir.path());
        assert!(matches!(missing, Err(Error::FileNotFound(_))));
        Ok(())
    }
}
