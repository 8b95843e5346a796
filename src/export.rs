//! Spreadsheet export and the file-placement helpers shared with the PDF sink.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fmt::plain;
use crate::models::ExpenseRecord;
use crate::reports;

pub const COLUMNS: [&str; 5] = ["DATE", "TRANSFER MODE", "ITEM", "BANK NAME", "AMOUNT"];

/// The five exported cells for one record, in `COLUMNS` order.
pub fn export_row(r: &ExpenseRecord) -> [String; 5] {
    [
        r.date.dmy(),
        r.transfer_mode.map(|m| m.label()).unwrap_or("").to_string(),
        r.item.clone(),
        r.bank_name.clone(),
        plain(r.amount),
    ]
}

/// Header, one row per record, then a row with `Total` under DATE and the
/// sum under AMOUNT.
pub fn write_csv<W: Write>(records: &[ExpenseRecord], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(COLUMNS)?;
    for r in records {
        wtr.write_record(export_row(r))?;
    }
    let total = plain(reports::total(records));
    wtr.write_record(["Total", "", "", "", total.as_str()])?;
    wtr.flush()?;
    Ok(())
}

pub fn default_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("{stem}-{date}.{ext}"))
}

pub fn write_csv_file(records: &[ExpenseRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(records, file)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "wrote csv export");
    Ok(())
}

#[cfg(feature = "pdf")]
pub fn write_bytes(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::record;

    #[test]
    fn test_csv_layout_and_total_row() {
        let records = vec![
            record("1", "2024-01-05", "100", Some("Food")),
            record("2", "2024-02-10", "0.5", None),
        ];
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "DATE,TRANSFER MODE,ITEM,BANK NAME,AMOUNT");
        assert_eq!(lines[1], "05-01-2024,Online,item 1,HDFC,100.00");
        assert_eq!(lines[3], "Total,,,,100.50");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_export_still_has_total() {
        let mut buf = Vec::new();
        write_csv(&[], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("Total,,,,0.00\n"));
    }

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_csv_file(&[record("1", "2024-01-05", "1", None)], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_default_path_shape() {
        let p = default_path(Path::new("/tmp/x"), "Expense Report", "csv");
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Expense Report-"));
        assert!(name.ends_with(".csv"));
    }
}
