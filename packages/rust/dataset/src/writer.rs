//! Dataset serialization: JSON lines, CSV, and pretty-printed JSON files.
//!
//! File writers go through a temp file in the target directory followed by a
//! rename, so an interrupted write never leaves a truncated output behind.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use docdistill_shared::{DistillError, Record, Result};

// ---------------------------------------------------------------------------
// Stream writers
// ---------------------------------------------------------------------------

/// Write one JSON object per record and line (`prompt` then `completion`).
///
/// Non-ASCII characters are written literally.
pub fn write_lines<W: Write>(records: &[Record], mut out: W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut out, record).map_err(|e| {
            if e.is_io() {
                DistillError::io("<stream>", e.into())
            } else {
                DistillError::Serialize(format!("JSONL record: {e}"))
            }
        })?;
        out.write_all(b"\n")
            .map_err(|e| DistillError::io("<stream>", e))?;
    }
    out.flush().map_err(|e| DistillError::io("<stream>", e))
}

/// Write a CSV table with a `prompt,completion` header row.
///
/// The header is derived from the first record, so an empty record set is
/// rejected instead of producing a headerless file.
pub fn write_table<W: Write>(records: &[Record], out: W) -> Result<()> {
    if records.is_empty() {
        return Err(DistillError::EmptyDataset {
            path: "<stream>".into(),
        });
    }

    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| DistillError::Serialize(format!("CSV record: {e}")))?;
    }
    writer.flush().map_err(|e| DistillError::io("<stream>", e))
}

/// Serialize `value` as JSON indented with four spaces, non-ASCII kept literal.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| DistillError::Serialize(format!("JSON serialization failed: {e}")))?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// File writers
// ---------------------------------------------------------------------------

/// Write `records` to `path` as JSON lines.
pub fn write_lines_file(path: &Path, records: &[Record]) -> Result<()> {
    let mut buf = Vec::new();
    write_lines(records, &mut buf)?;
    write_atomic(path, &buf)?;
    debug!(path = %path.display(), records = records.len(), "wrote JSONL file");
    Ok(())
}

/// Write `records` to `path` as CSV.
///
/// An empty record set fails with [`DistillError::EmptyDataset`] before the
/// file is created.
pub fn write_table_file(path: &Path, records: &[Record]) -> Result<()> {
    if records.is_empty() {
        return Err(DistillError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    let mut buf = Vec::new();
    write_table(records, &mut buf)?;
    write_atomic(path, &buf)?;
    debug!(path = %path.display(), records = records.len(), "wrote CSV file");
    Ok(())
}

/// Write `value` to `path` as four-space indented JSON.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, &to_pretty_json(value)?)?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
///
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| DistillError::io(dir, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| DistillError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    let temp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, bytes).map_err(|e| DistillError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| DistillError::io(path, e))?;
    Ok(())
}
