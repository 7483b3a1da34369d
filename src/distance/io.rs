//! Flat-file distance and vector formats.
//!
//! Distance files hold one record per line, `"<id1> <id2> <distance>"`, with
//! 1-based point ids. Vector files hold one point per line as
//! whitespace-separated numbers. Point ids in files are 1-based; every index
//! handed to or returned from the rest of the crate is 0-based.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::{DistanceTable, Metric};
use crate::error::{Error, Result};

fn malformed(line: usize, message: impl Into<String>) -> Error {
    Error::MalformedRecord {
        line,
        message: message.into(),
    }
}

fn parse_id(field: &str, line: usize) -> Result<usize> {
    let id: usize = field
        .parse()
        .map_err(|_| malformed(line, format!("invalid point id {field:?}")))?;
    if id == 0 {
        return Err(malformed(line, "point ids start at 1"));
    }
    Ok(id)
}

/// Parse distance records into a [`DistanceTable`].
///
/// The number of points is the largest id seen. Self distances are implied;
/// an explicit self record must be 0. Blank lines are skipped.
pub fn read_distances<R: BufRead>(reader: R) -> Result<DistanceTable> {
    let mut records: Vec<(usize, usize, usize, f32)> = Vec::new();
    let mut max_id = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 3 {
            return Err(malformed(
                line_no,
                format!("expected 3 fields, found {}", fields.len()),
            ));
        }
        let a = parse_id(fields[0], line_no)?;
        let b = parse_id(fields[1], line_no)?;
        let d: f32 = fields[2]
            .parse()
            .map_err(|_| malformed(line_no, format!("invalid distance {:?}", fields[2])))?;
        max_id = max_id.max(a).max(b);
        records.push((line_no, a - 1, b - 1, d));
    }

    let mut table = DistanceTable::new(max_id);
    for (line_no, i, j, d) in records {
        match table.insert(i, j, d) {
            Ok(Some(prev)) if prev != d => {
                return Err(malformed(
                    line_no,
                    format!("conflicting distance {d} for a pair already recorded as {prev}"),
                ));
            }
            Ok(_) => {}
            Err(Error::InvalidDistance { value, .. }) => {
                return Err(malformed(line_no, format!("invalid distance {value}")));
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        n_points = max_id,
        n_pairs = table.len(),
        complete = table.is_complete(),
        "loaded distance records"
    );
    Ok(table)
}

/// Load a distance file from disk.
pub fn load_distances(path: impl AsRef<Path>) -> Result<DistanceTable> {
    let file = File::open(path)?;
    read_distances(BufReader::new(file))
}

/// Parse one vector per line. All vectors must have the same length.
pub fn read_vectors<R: BufRead>(reader: R) -> Result<Vec<Vec<f32>>> {
    let mut vectors: Vec<Vec<f32>> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let v = line
            .split_whitespace()
            .map(|f| {
                f.parse::<f32>()
                    .map_err(|_| malformed(line_no, format!("invalid component {f:?}")))
            })
            .collect::<Result<Vec<f32>>>()?;
        if let Some(first) = vectors.first() {
            if first.len() != v.len() {
                return Err(Error::DimensionMismatch {
                    expected: first.len(),
                    found: v.len(),
                });
            }
        }
        vectors.push(v);
    }
    Ok(vectors)
}

/// Load a vector file from disk.
pub fn load_vectors(path: impl AsRef<Path>) -> Result<Vec<Vec<f32>>> {
    let file = File::open(path)?;
    read_vectors(BufReader::new(file))
}

/// Write a distance record for every unordered pair `i <= j` of `data`.
///
/// Self pairs are written as 0 regardless of the metric. Returns the number
/// of records written.
pub fn write_distances<W, M>(data: &[Vec<f32>], metric: &M, mut writer: W) -> Result<usize>
where
    W: Write,
    M: Metric + ?Sized,
{
    let n = data.len();
    let mut written = 0usize;
    for i in 0..n {
        writeln!(writer, "{} {} 0", i + 1, i + 1)?;
        written += 1;
        for j in (i + 1)..n {
            let d = metric.distance(&data[i], &data[j])?;
            writeln!(writer, "{} {} {}", i + 1, j + 1, d)?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}

/// Read vectors from `vectors_path` and write their distance file to `out_path`.
pub fn build_distance_file<M: Metric + ?Sized>(
    vectors_path: impl AsRef<Path>,
    metric: &M,
    out_path: impl AsRef<Path>,
) -> Result<usize> {
    let vectors = load_vectors(vectors_path)?;
    let out = BufWriter::new(File::create(out_path)?);
    let written = write_distances(&vectors, metric, out)?;
    debug!(n_points = vectors.len(), records = written, "wrote distance file");
    Ok(written)
}
