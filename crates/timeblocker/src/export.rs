use crate::constants::{FSDB_MAGIC, FSDB_TAB_SEPARATOR, HEIGHT_COLUMN};
use crate::emit::LayoutSink;
use crate::error::{Result, TimeblockError};
use crate::interval::LanedInterval;
use crate::table_reader::{ColumnSpec, TableFormat};

use csv::WriterBuilder;
use log::debug;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// Opens `path` for writing, or stdout when `path` is `None` or `-`
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = File::create(p).map_err(|e| TimeblockError::CreateFile {
                path: p.to_path_buf(),
                source: e,
            })?;
            debug!("Writing to {}", p.display());
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Writes laned intervals as `begin, end, height` rows
pub struct TableWriter<W: Write> {
    wtr: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> TableWriter<W> {
    /// Writes the header immediately. `Auto` is treated as CSV.
    pub fn new(mut writer: W, format: TableFormat, columns: &ColumnSpec) -> Result<Self> {
        let header = [columns.begin.as_str(), columns.end.as_str(), HEIGHT_COLUMN];

        let wtr = match format {
            TableFormat::Fsdb => {
                writeln!(
                    writer,
                    "{} {} {}",
                    FSDB_MAGIC,
                    FSDB_TAB_SEPARATOR,
                    header.join(" ")
                )?;
                WriterBuilder::new()
                    .delimiter(b'\t')
                    .has_headers(false)
                    .from_writer(writer)
            }
            TableFormat::Csv | TableFormat::Auto => {
                #[allow(unused_mut)]
                let mut builder = WriterBuilder::new();
                #[cfg(windows)]
                {
                    use csv::Terminator;
                    builder = builder.terminator(Terminator::CRLF);
                }
                let mut wtr = builder.from_writer(writer);
                wtr.write_record(header)?;
                wtr
            }
        };

        Ok(Self { wtr, rows: 0 })
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flushes and hands back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| TimeblockError::Io(e.into_error()))
    }
}

impl<W: Write> LayoutSink for TableWriter<W> {
    fn emit(&mut self, laned: &LanedInterval) -> Result<()> {
        let [begin, end, lane] = laned.as_row();
        self.wtr.write_record([
            begin.to_string(),
            end.to_string(),
            lane.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.wtr.flush()?;
        debug!("Wrote {} rows", self.rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::Layout;
    use crate::emit::emit_layout;
    use crate::interval::Interval;
    use tempfile::TempDir;

    fn layout() -> Layout {
        Layout {
            intervals: vec![
                LanedInterval {
                    interval: Interval::new(4, 8),
                    lane: 1,
                },
                LanedInterval {
                    interval: Interval::new(4, 6).with_polarity(-1.0),
                    lane: 2,
                },
            ],
            ..Layout::default()
        }
    }

    fn render(format: TableFormat, columns: &ColumnSpec) -> String {
        let mut writer = TableWriter::new(Vec::new(), format, columns).unwrap();
        emit_layout(&layout(), &mut writer).unwrap();
        assert_eq!(writer.rows_written(), 2);
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    #[cfg(not(windows))]
    fn test_csv_output() {
        let out = render(TableFormat::Csv, &ColumnSpec::default());
        assert_eq!(out, "begin_time,end_time,height\n4,8,1\n4,6,2\n");
    }

    #[test]
    fn test_fsdb_output_uses_configured_names() {
        let columns = ColumnSpec {
            begin: "start".to_string(),
            end: "stop".to_string(),
            polarity: None,
        };
        let out = render(TableFormat::Fsdb, &columns);
        assert_eq!(out, "#fsdb -F t start stop height\n4\t8\t1\n4\t6\t2\n");
    }

    #[test]
    #[cfg(not(windows))]
    fn test_empty_layout_writes_header_only() {
        let mut writer =
            TableWriter::new(Vec::new(), TableFormat::Auto, &ColumnSpec::default()).unwrap();
        emit_layout(&Layout::default(), &mut writer).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "begin_time,end_time,height\n");
    }

    #[test]
    fn test_open_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layout.csv");
        {
            let mut out = open_output(Some(&path)).unwrap();
            out.write_all(b"x").unwrap();
            out.flush().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_open_output_invalid_directory() {
        let invalid_path = Path::new("/invalid/nonexistent/deeply/nested/layout.csv");
        match open_output(Some(invalid_path)) {
            Err(e) => assert!(e.to_string().contains("Failed to create file"), "{e}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
