// src/export/columnar.rs
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::{info, instrument};

use crate::error::Result;
use crate::usage::UsageRecord;

/// Every column is exported as nullable Utf8; blank cells become nulls.
fn schema(headers: &[String]) -> Schema {
    Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    )
}

fn columns(headers: &[String], records: &[&UsageRecord]) -> Vec<ArrayRef> {
    (0..headers.len())
        .map(|i| {
            let values: Vec<Option<&str>> = records
                .iter()
                .map(|r| r.raw.get(i).map(String::as_str).filter(|v| !v.is_empty()))
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect()
}

/// Write the filtered rows to a Snappy-compressed Parquet file.
#[instrument(level = "info", skip(headers, records), fields(path = %path.display(), rows = records.len()))]
pub fn export_parquet(headers: &[String], records: &[&UsageRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let schema = Arc::new(schema(headers));
    let batch = RecordBatch::try_new(schema.clone(), columns(headers, records))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let tmp = path.with_extension("parquet.tmp");
    let file = File::create(&tmp)?;
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    fs::rename(&tmp, path)?;

    info!("exported Parquet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::tests::sample_table;
    use crate::usage::{apply, FilterSelection};
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn writes_readable_snappy_parquet() -> Result<()> {
        let dir = tempdir()?;
        let table = sample_table();
        let view = apply(&table, &FilterSelection::with_tools(["vcs"]))?;
        let out = dir.path().join("filtered_data.parquet");
        export_parquet(view.headers, &view.records, &out)?;
        assert!(out.is_file());
        assert!(!dir.path().join("filtered_data.parquet.tmp").exists());

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&out)?)?;
        let meta = builder.metadata().clone();
        assert_eq!(
            meta.row_group(0).column(0).compression(),
            Compression::SNAPPY
        );
        let batches: Vec<RecordBatch> = builder
            .build()?
            .collect::<std::result::Result<_, _>>()?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);

        let batch = &batches[0];
        assert_eq!(batch.num_columns(), table.headers.len());
        let tool_idx = batch.schema().index_of("tool")?;
        let tools = batch
            .column(tool_idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!((0..tools.len()).all(|i| tools.value(i) == "vcs"));

        // bob's second row has a blank rating
        let rating_idx = batch.schema().index_of("metadata.feedback_rating")?;
        assert!(batch.column(rating_idx).is_null(2));
        Ok(())
    }

    #[test]
    fn empty_view_still_has_schema() -> Result<()> {
        let dir = tempdir()?;
        let headers = vec!["Username".to_string(), "tool".to_string()];
        let out = dir.path().join("empty.parquet");
        export_parquet(&headers, &[], &out)?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&out)?)?;
        assert_eq!(builder.schema().fields().len(), 2);
        Ok(())
    }
}
