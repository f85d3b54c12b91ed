use kausage::sheet::{self, RawSheet};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs::File, path::Path, process::exit};

const SAMPLE_ROWS: usize = 5;

fn main() {
    // One spreadsheet (or exported Parquet file), optionally a sheet name.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <FILE> [SHEET]", args[0]);
        exit(1);
    }
    let path = Path::new(&args[1]);
    let sheet = args.get(2).map(String::as_str);

    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("parquet"));
    let result = if is_parquet {
        inspect_parquet(path)
    } else {
        inspect_sheet(path, sheet)
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print sheet names, columns, row count and the first few rows.
fn inspect_sheet(path: &Path, sheet: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let names = sheet::sheet_names(path)?;
    let raw: RawSheet = sheet::load_sheet(path, sheet)?;

    println!("=== Spreadsheet: {} ===", path.display());
    if names.iter().any(|n| !n.is_empty()) {
        println!("Sheets:               {}", names.join(", "));
    }
    println!("Sheet shown:          {}", sheet.unwrap_or("<first>"));
    println!("Rows:                 {}", raw.len());
    println!("Columns:              {}", raw.headers.len());
    println!();

    println!("=== Columns ===");
    for (i, h) in raw.headers.iter().enumerate() {
        let filled = raw.rows.iter().filter(|r| !r[i].is_empty()).count();
        println!("- {:<30} | non-empty: {}", h, filled);
    }
    println!();

    println!("=== First {} rows ===", SAMPLE_ROWS.min(raw.len()));
    for row in raw.rows.iter().take(SAMPLE_ROWS) {
        println!("{}", row.join(" | "));
    }
    Ok(())
}

/// Row count and per-column compression of an exported Parquet file.
fn inspect_parquet(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== Parquet File: {} ===", path.display());
    println!("Total rows:           {}", file_meta.num_rows());
    println!("Number of row groups: {}", meta.num_row_groups());
    println!("File size on disk:    {} bytes", std::fs::metadata(path)?.len());
    println!();

    println!("=== Columns ===");
    for (i, col) in file_meta.schema_descr().columns().iter().enumerate() {
        let compression = if meta.num_row_groups() > 0 {
            format!("{:?}", meta.row_group(0).column(i).compression())
        } else {
            "<none>".into()
        };
        println!("- {:<30} | Compression: {}", col.name(), compression);
    }
    Ok(())
}
