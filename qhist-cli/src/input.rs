//! Plain-text event input and argument parsing helpers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use qhist_core::{Event, FloatArrayEventList, Vector3};

use crate::{CliError, Result};

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
}

/// Parses `x y z [code]` lines; fields may be separated by whitespace or
/// commas. Blank lines and `#` comments are skipped, and a missing code
/// defaults to 1.
pub fn parse_events<R: BufRead>(reader: R) -> Result<FloatArrayEventList> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let fields: Vec<&str> = split_fields(content).collect();
        let bad_line = |message: String| CliError::Parse {
            line: index + 1,
            message,
        };
        if !(3..=4).contains(&fields.len()) {
            return Err(bad_line(format!(
                "expected 3 or 4 fields, found {}",
                fields.len()
            )));
        }

        let mut coords = [0.0f32; 3];
        for (slot, field) in coords.iter_mut().zip(&fields) {
            *slot = field
                .parse()
                .map_err(|_| bad_line(format!("invalid coordinate '{field}'")))?;
        }
        let code = match fields.get(3) {
            Some(field) => field
                .parse()
                .map_err(|_| bad_line(format!("invalid code '{field}'")))?,
            None => 1,
        };
        events.push(Event::new(coords[0], coords[1], coords[2], code));
    }
    Ok(FloatArrayEventList::from_events(&events))
}

/// Reads an event file.
pub fn read_events(path: &Path) -> Result<FloatArrayEventList> {
    let file = File::open(path)?;
    parse_events(BufReader::new(file))
}

/// Parses a direction given as `x,y,z`.
pub fn parse_vector(s: &str) -> std::result::Result<Vector3, String> {
    let parts: Vec<f64> = split_fields(s)
        .map(|p| p.parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<std::result::Result<_, _>>()?;
    match parts.as_slice() {
        &[x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(format!("expected 3 components, found {}", parts.len())),
    }
}

/// Intensity level boundaries given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Levels(pub Vec<f64>);

/// Parses comma separated level boundaries; `inf` is accepted.
pub fn parse_levels(s: &str) -> std::result::Result<Levels, String> {
    split_fields(s)
        .map(|p| p.parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<std::result::Result<_, _>>()
        .map(Levels)
}
