//! Point cloud and object files.
//!
//! Clouds are read from:
//! - `.ply`: the `vertex` element's `x`, `y`, `z` (and optional `intensity`)
//!   properties, ASCII or binary.
//! - Anything else: whitespace-separated text, one point per line, as
//!   `x y z`, `x y z intensity`, or `label x y z`.
//!
//! Object lists are text with one `label x y z` per line; the label is
//! always the first token, even when it looks like a number. A `.ply`
//! object file contributes its vertex positions.
//!
//! In both text formats blank lines and lines starting with `#` are
//! skipped, and coordinates must be finite.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use depth_types::{Header, LidarPoint, PointCloudFrame};
use glam::DVec3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use tracing::debug;

/// One parsed record, kept in double precision until the caller narrows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// Position in the file's frame.
    pub position: DVec3,
    /// Return intensity, if the file carries one.
    pub intensity: Option<f32>,
}

impl Record {
    fn to_lidar_point(self) -> LidarPoint {
        let p = self.position.as_vec3().to_array();
        match self.intensity {
            Some(i) => LidarPoint::with_intensity(p, i),
            None => LidarPoint::new(p),
        }
    }
}

fn is_ply(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"))
}

fn read_text<T>(path: &Path, parse: impl FnOnce(&str) -> Result<T>) -> Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Reads every record of a cloud file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line/vertex is malformed.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let records = if is_ply(path) {
        read_ply(path)?
    } else {
        read_text(path, parse_text)?
    };

    debug!(path = %path.display(), points = records.len(), "Loaded cloud file");
    Ok(records)
}

/// Loads a cloud file as a frame with the given header.
///
/// # Errors
///
/// See [`read_records`].
pub fn load_cloud(path: &Path, header: Header) -> Result<PointCloudFrame> {
    let points = read_records(path)?
        .into_iter()
        .map(Record::to_lidar_point)
        .collect();
    Ok(PointCloudFrame::from_points(header, points))
}

/// Loads object positions without narrowing them to `f32`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not
/// `label x y z` with finite coordinates.
pub fn load_positions(path: &Path) -> Result<Vec<DVec3>> {
    let positions = if is_ply(path) {
        read_ply(path)?.into_iter().map(|r| r.position).collect()
    } else {
        read_text(path, parse_objects)?
    };

    debug!(path = %path.display(), objects = positions.len(), "Loaded object file");
    Ok(positions)
}

/// Non-comment lines with their 1-based line numbers and tokens.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines().enumerate().filter_map(|(index, line)| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            None
        } else {
            Some((index + 1, line.split_whitespace().collect()))
        }
    })
}

/// Parses the whitespace-separated cloud format.
///
/// # Errors
///
/// Returns an error naming the first malformed line.
pub fn parse_text(text: &str) -> Result<Vec<Record>> {
    data_lines(text)
        .map(|(line_no, tokens)| {
            let numbers = match tokens.as_slice() {
                // Leading non-numeric label.
                [label, rest @ ..] if label.parse::<f64>().is_err() => {
                    parse_numbers(rest, line_no)?
                }
                all => parse_numbers(all, line_no)?,
            };

            match numbers.as_slice() {
                [x, y, z] => Ok(Record {
                    position: DVec3::new(*x, *y, *z),
                    intensity: None,
                }),
                #[allow(clippy::cast_possible_truncation)]
                [x, y, z, i] => Ok(Record {
                    position: DVec3::new(*x, *y, *z),
                    intensity: Some(*i as f32),
                }),
                other => bail!(
                    "line {line_no}: expected 3 or 4 numbers, found {}",
                    other.len()
                ),
            }
        })
        .collect()
}

/// Parses an object list, one `label x y z` per line.
///
/// # Errors
///
/// Returns an error naming the first malformed line.
pub fn parse_objects(text: &str) -> Result<Vec<DVec3>> {
    data_lines(text)
        .map(|(line_no, tokens)| match tokens.as_slice() {
            [_label, x, y, z] => Ok(DVec3::new(
                parse_number(x, line_no)?,
                parse_number(y, line_no)?,
                parse_number(z, line_no)?,
            )),
            _ => bail!(
                "line {line_no}: expected `label x y z`, found {} fields",
                tokens.len()
            ),
        })
        .collect()
}

fn parse_numbers(tokens: &[&str], line_no: usize) -> Result<Vec<f64>> {
    tokens.iter().map(|t| parse_number(t, line_no)).collect()
}

fn parse_number(token: &str, line_no: usize) -> Result<f64> {
    let value = token
        .parse::<f64>()
        .with_context(|| format!("line {line_no}: '{token}' is not a number"))?;
    if !value.is_finite() {
        bail!("line {line_no}: '{token}' is not a finite number");
    }
    Ok(value)
}

fn read_ply(path: &Path) -> Result<Vec<Record>> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut file)
        .with_context(|| format!("Failed to parse PLY {}", path.display()))?;

    let Some(vertices) = ply.payload.get("vertex") else {
        bail!("{} has no vertex element", path.display());
    };

    vertices
        .iter()
        .enumerate()
        .map(|(index, vertex)| {
            let coord = |key: &str| {
                scalar(vertex, key)
                    .with_context(|| format!("vertex {index}: missing numeric property '{key}'"))
            };
            #[allow(clippy::cast_possible_truncation)]
            let intensity = scalar(vertex, "intensity").map(|i| i as f32);
            Ok(Record {
                position: DVec3::new(coord("x")?, coord("y")?, coord("z")?),
                intensity,
            })
        })
        .collect()
}

fn scalar(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(f64::from(*v)),
        Property::UInt(v) => Some(f64::from(*v)),
        Property::Short(v) => Some(f64::from(*v)),
        Property::UShort(v) => Some(f64::from(*v)),
        Property::Char(v) => Some(f64::from(*v)),
        Property::UChar(v) => Some(f64::from(*v)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use depth_types::Timestamp;
    use std::io::Write;

    #[test]
    fn text_formats() {
        let text = "\
# x y z [intensity]
1 2 3

4.5 -5 6 0.25
    car 10 0 -2
";
        let records = parse_text(text).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(records[0].intensity, None);
        assert_eq!(records[1].intensity, Some(0.25));
        assert_eq!(records[2].position, DVec3::new(10.0, 0.0, -2.0));
    }

    #[test]
    fn text_reports_bad_line() {
        let err = parse_text("1 2 3\n1 two 3\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        let err = parse_text("1 2\n").unwrap_err();
        assert!(err.to_string().contains("expected 3 or 4 numbers"));
    }

    #[test]
    fn text_rejects_non_finite_coordinates() {
        let err = parse_text("1 2 3\n0 nan 4\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"));
        assert!(msg.contains("not a finite number"));

        assert!(parse_text("inf 0 4\n").is_err());
        assert!(parse_text("1 2 3 infinity\n").is_err());
    }

    #[test]
    fn objects_numeric_label_is_not_a_coordinate() {
        let positions = parse_objects("17 1.0 2.0 5.0\n").unwrap();
        assert_eq!(positions, vec![DVec3::new(1.0, 2.0, 5.0)]);
    }

    #[test]
    fn objects_number_like_labels() {
        let text = "\
# label x y z
nan 0 0 12
inf -1 0.5 3
buoy 2 2 8
";
        let positions = parse_objects(text).unwrap();
        assert_eq!(
            positions,
            vec![
                DVec3::new(0.0, 0.0, 12.0),
                DVec3::new(-1.0, 0.5, 3.0),
                DVec3::new(2.0, 2.0, 8.0),
            ]
        );
    }

    #[test]
    fn objects_require_label_and_three_coordinates() {
        let err = parse_objects("gate 0 0 15\n1.0 2.0 5.0\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"));
        assert!(msg.contains("label x y z"));

        assert!(parse_objects("gate 0 0 15 0.5\n").is_err());
        assert!(parse_objects("gate 0 nan 15\n").is_err());
    }

    #[test]
    fn load_text_objects() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "3 0 0 15").unwrap();
        writeln!(file, "buoy 1 -1 30").unwrap();

        let positions = load_positions(file.path()).unwrap();
        assert_eq!(
            positions,
            vec![DVec3::new(0.0, 0.0, 15.0), DVec3::new(1.0, -1.0, 30.0)]
        );
    }

    #[test]
    fn load_text_cloud() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "0 0 2").unwrap();
        writeln!(file, "1 0 3 0.5").unwrap();

        let header = Header::new(Timestamp::from_nanos(1), "lidar");
        let cloud = load_cloud(file.path(), header.clone()).unwrap();
        assert_eq!(cloud.header, header);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.points[1].intensity, Some(0.5));
    }

    #[test]
    fn load_ply_cloud() {
        let mut file = tempfile::Builder::new().suffix(".ply").tempfile().unwrap();
        write!(
            file,
            "ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
property float intensity
end_header
0 0 2 0.5
1 -1 3 0.1
"
        )
        .unwrap();

        let records = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, DVec3::new(0.0, 0.0, 2.0));
        assert_eq!(records[0].intensity, Some(0.5));
        assert_eq!(records[1].position, DVec3::new(1.0, -1.0, 3.0));
    }

    #[test]
    fn load_ply_double_without_intensity() {
        let mut file = tempfile::Builder::new().suffix(".PLY").tempfile().unwrap();
        write!(
            file,
            "ply
format ascii 1.0
element vertex 1
property double x
property double y
property double z
end_header
0.125 0.25 8.5
"
        )
        .unwrap();

        let positions = load_positions(file.path()).unwrap();
        assert_eq!(positions, vec![DVec3::new(0.125, 0.25, 8.5)]);
    }

    #[test]
    fn load_missing_file() {
        assert!(read_records(Path::new("/nonexistent/cloud.txt")).is_err());
        assert!(read_records(Path::new("/nonexistent/cloud.ply")).is_err());
    }
}
