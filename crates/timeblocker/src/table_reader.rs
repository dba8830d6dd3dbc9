use crate::constants::{DEFAULT_BEGIN_COLUMN, DEFAULT_END_COLUMN, FSDB_MAGIC, MAX_ABS_VALUE};
use crate::error::{Result, TimeblockError};
use crate::interval::RawInterval;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

/// Tabular encodings understood on input and output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Sniff from the first line on input, mirror the input on output
    #[default]
    Auto,
    Csv,
    Fsdb,
}

impl TableFormat {
    /// Picks `fallback` when `self` is `Auto`
    pub fn or(self, fallback: TableFormat) -> TableFormat {
        match self {
            TableFormat::Auto => fallback,
            other => other,
        }
    }
}

/// Names of the columns to pull out of each record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub begin: String,
    pub end: String,
    pub polarity: Option<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            begin: DEFAULT_BEGIN_COLUMN.to_string(),
            end: DEFAULT_END_COLUMN.to_string(),
            polarity: None,
        }
    }
}

/// Records read from one table
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTable {
    /// Encoding actually found, never `Auto`
    pub format: TableFormat,
    pub records: Vec<RawInterval>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndices {
    begin: usize,
    end: usize,
    polarity: Option<usize>,
}

impl ColumnIndices {
    fn resolve(header: &[String], spec: &ColumnSpec) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TimeblockError::MissingColumn {
                    column: name.to_string(),
                    available: header.to_vec(),
                })
        };
        Ok(Self {
            begin: find(&spec.begin)?,
            end: find(&spec.end)?,
            polarity: spec.polarity.as_deref().map(find).transpose()?,
        })
    }
}

/// Reads intervals from `path`, or from stdin when `path` is `None` or `-`
pub fn read_intervals(
    path: Option<&Path>,
    columns: &ColumnSpec,
    format: TableFormat,
) -> Result<IntervalTable> {
    match path {
        Some(p) if p != Path::new("-") => {
            debug!("Reading intervals from {}", p.display());
            let file = File::open(p)?;
            read_intervals_from_reader(file, columns, format)
        }
        _ => {
            debug!("Reading intervals from stdin");
            read_intervals_from_reader(io::stdin().lock(), columns, format)
        }
    }
}

/// Reads a CSV or FSDB table; columns are looked up by name
pub fn read_intervals_from_reader<R: Read>(
    reader: R,
    columns: &ColumnSpec,
    format: TableFormat,
) -> Result<IntervalTable> {
    let mut reader = BufReader::new(reader);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;

    if first_line.trim().is_empty() {
        return Ok(IntervalTable {
            format: format.or(TableFormat::Csv),
            records: Vec::new(),
        });
    }

    let detected = if first_line.starts_with(FSDB_MAGIC) {
        TableFormat::Fsdb
    } else {
        TableFormat::Csv
    };
    let format = format.or(detected);

    let records = match format {
        TableFormat::Fsdb => {
            let (separator, header) = parse_fsdb_header(&first_line)?;
            // the header line was consumed before the csv reader saw the stream
            match separator {
                FsdbSeparator::Byte(delimiter) => {
                    read_fsdb_body(reader, delimiter, &header, columns)?
                }
                FsdbSeparator::Whitespace => {
                    let body = collapse_whitespace(reader)?;
                    read_fsdb_body(Cursor::new(body), b'\t', &header, columns)?
                }
            }
        }
        TableFormat::Csv | TableFormat::Auto => {
            let mut rdr = ReaderBuilder::new()
                .has_headers(true)
                .trim(Trim::All)
                .flexible(true)
                .from_reader(Cursor::new(first_line).chain(reader));
            let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
            read_records(&mut rdr, &header, columns, 0)?
        }
    };

    debug!("Read {} intervals ({:?})", records.len(), format);
    Ok(IntervalTable { format, records })
}

/// Field separator declared by an FSDB header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FsdbSeparator {
    /// `-F D` and the default: any run of spaces or tabs
    Whitespace,
    Byte(u8),
}

/// Splits `#fsdb [-F x] name[:type] ...` into a separator and column names
fn parse_fsdb_header(line: &str) -> Result<(FsdbSeparator, Vec<String>)> {
    let mut tokens = line.trim_end().split_whitespace();
    if tokens.next() != Some(FSDB_MAGIC) {
        return Err(TimeblockError::FsdbHeader(format!(
            "expected '{}' at start of line, found '{}'",
            FSDB_MAGIC,
            line.trim_end()
        )));
    }

    let mut separator = FsdbSeparator::Whitespace;
    let mut names = Vec::new();
    while let Some(token) = tokens.next() {
        if token == "-F" {
            let code = tokens.next().ok_or_else(|| {
                TimeblockError::FsdbHeader("-F without a separator code".to_string())
            })?;
            separator = match code {
                "D" => FsdbSeparator::Whitespace,
                "t" => FsdbSeparator::Byte(b'\t'),
                "s" => FsdbSeparator::Byte(b' '),
                "C" | "c" => FsdbSeparator::Byte(b','),
                other => {
                    return Err(TimeblockError::FsdbHeader(format!(
                        "unsupported separator code '{}'",
                        other
                    )));
                }
            };
        } else {
            let name = token.split(':').next().unwrap_or(token);
            names.push(name.to_string());
        }
    }

    if names.is_empty() {
        return Err(TimeblockError::FsdbHeader("no columns declared".to_string()));
    }
    Ok((separator, names))
}

/// Rewrites whitespace-separated rows as tab-separated ones, keeping line
/// numbers and comment lines intact
fn collapse_whitespace<B: BufRead>(body: B) -> Result<String> {
    let mut out = String::new();
    for line in body.lines() {
        let line = line?;
        let line = line.trim_start();
        if line.starts_with('#') {
            out.push_str(line);
        } else {
            out.push_str(&line.split_whitespace().collect::<Vec<_>>().join("\t"));
        }
        out.push('\n');
    }
    Ok(out)
}

fn read_fsdb_body<B: Read>(
    body: B,
    delimiter: u8,
    header: &[String],
    columns: &ColumnSpec,
) -> Result<Vec<RawInterval>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(body);
    read_records(&mut rdr, header, columns, 1)
}

fn read_records<R: Read>(
    rdr: &mut csv::Reader<R>,
    header: &[String],
    columns: &ColumnSpec,
    line_offset: u64,
) -> Result<Vec<RawInterval>> {
    let indices = ColumnIndices::resolve(header, columns)?;
    let mut records = Vec::new();
    let mut last_begin = f64::NEG_INFINITY;
    let mut warned_unsorted = false;

    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let row = rec
            .position()
            .map(|p| (p.line() + line_offset) as usize)
            .unwrap_or(i + 2);

        let begin = parse_field(&rec, indices.begin, &columns.begin, row)?;
        let end = parse_field(&rec, indices.end, &columns.end, row)?;
        let mut raw = RawInterval::new(begin, end);
        if let (Some(idx), Some(name)) = (indices.polarity, columns.polarity.as_deref()) {
            raw = raw.with_polarity(parse_field(&rec, idx, name, row)?);
        }

        if begin < last_begin && !warned_unsorted {
            warn!(
                "Input is not sorted by '{}' (row {}); lanes may overlap unless sorting is enabled",
                columns.begin, row
            );
            warned_unsorted = true;
        }
        last_begin = last_begin.max(begin);
        records.push(raw);
    }
    Ok(records)
}

fn parse_field(rec: &StringRecord, index: usize, column: &str, row: usize) -> Result<f64> {
    let value = rec
        .get(index)
        .map(str::trim)
        .ok_or_else(|| TimeblockError::ShortRow {
            row,
            got: rec.len(),
            column: column.to_string(),
        })?;
    let parsed: f64 = value.parse().map_err(|source| TimeblockError::ValueParse {
        row,
        column: column.to_string(),
        value: value.to_string(),
        source,
    })?;
    if !parsed.is_finite() || parsed.abs() > MAX_ABS_VALUE {
        return Err(TimeblockError::ValueRange {
            row,
            column: column.to_string(),
            value: value.to_string(),
        });
    }
    Ok(parsed)
}
