//! ASCII point cloud I/O.
//!
//! Input clouds are loaded from XYZ files (one `x y z` triple per line,
//! `#` comments allowed). Results are exported one record per core point as
//!
//! ```text
//! x y z nx ny nz distance lod significant
//! ```
//!
//! with `NaN` for undefined fields and `0`/`1` for the significance flag,
//! keeping the file index-aligned with the core cloud.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};

use crate::cloud::PointCloud;
use crate::error::{M3c2Error, M3c2Result};
use crate::result::ComparisonResult;

/// Loads a point cloud from an ASCII XYZ file.
///
/// Empty lines and lines starting with `#` or `//` are skipped. Extra
/// columns beyond the first three are ignored.
///
/// # Errors
///
/// Returns an error when the file cannot be read or a record has fewer than
/// three coordinates or a non-numeric coordinate.
pub fn load_xyz<P: AsRef<Path>>(path: P) -> M3c2Result<PointCloud> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut cloud = PointCloud::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let mut fields = line.split_whitespace();
        let mut coord = |name: &str| -> M3c2Result<f64> {
            let field = fields.next().ok_or_else(|| M3c2Error::Parse {
                line: line_idx + 1,
                reason: format!("missing {name} coordinate"),
            })?;
            field.parse().map_err(|_| M3c2Error::Parse {
                line: line_idx + 1,
                reason: format!("invalid {name} coordinate: {field}"),
            })
        };

        let x = coord("x")?;
        let y = coord("y")?;
        let z = coord("z")?;
        cloud.push(Point3::new(x, y, z));
    }

    Ok(cloud)
}

/// Saves a point cloud as an ASCII XYZ file.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn save_xyz<P: AsRef<Path>>(cloud: &PointCloud, path: P) -> M3c2Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for p in &cloud.points {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }

    writer.flush()?;
    Ok(())
}

/// Exports a comparison result, one record per core point.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn save_result<P: AsRef<Path>>(result: &ComparisonResult, path: P) -> M3c2Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# x y z nx ny nz distance lod significant")?;

    for record in &result.results {
        let p = record.position;
        let n = record.normal.unwrap_or_else(|| Vector3::new(f64::NAN, f64::NAN, f64::NAN));
        let distance = record.distance.unwrap_or(f64::NAN);
        let lod = record.lod.unwrap_or(f64::NAN);
        let flag = u8::from(record.significant);

        writeln!(
            writer,
            "{} {} {} {} {} {} {} {} {}",
            p.x, p.y, p.z, n.x, n.y, n.z, distance, lod, flag
        )?;
    }

    writer.flush()?;
    Ok(())
}
