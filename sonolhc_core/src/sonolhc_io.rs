//! HYPATIA text export → `Event` records.
//!
//! Events are separated by lines containing `---------`. Inside an event:
//!
//! - line 1: event id
//! - line 2: free-text description (missing ET, date, run number, ...)
//! - every following line: one `track…` or `cluster…` record of 19
//!   whitespace-separated columns
//!
//! Track columns:
//! `name charge p pT φ θ η cot(θ) aux aux aux true_kind interest xmin ymin zmin xmax ymax zmax`
//!
//! Cluster columns:
//! `name aux aux ET φ θ η` followed by 12 unused columns.

use crate::sonolhc_event::{ChargeMarker, Cluster, Event, ParticleTrack, TRUE_KIND_MUON};
use nalgebra::Vector3;
use std::path::Path;
use thiserror::Error;

pub const SEPARATOR: &str = "---------";
pub const RECORD_COLUMNS: usize = 19;

/// Errors produced while reading an event file. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Line {line}: record is neither a track nor a cluster: {content:?}")]
    UnknownRecord { line: usize, content: String },

    #[error("Line {line}: expected {expected} columns, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: column {column} is not a number: {value:?}")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Line {line}: event block has no description line")]
    MissingHeader { line: usize },

    #[error("Failed to read event file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads and parses an event file.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>, ParseError> {
    let text = std::fs::read_to_string(path)?;
    parse_events(&text)
}

/// Parses every event in `text`, in file order.
///
/// A final block without a closing separator is still returned. The id and
/// description are taken by position, so an empty description line is kept
/// as an empty description.
pub fn parse_events(text: &str) -> Result<Vec<Event>, ParseError> {
    let mut events = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.contains(SEPARATOR) {
            if !block.is_empty() {
                events.push(convert_block(&block)?);
                block.clear();
            }
            continue;
        }
        // Blank lines before the id line are padding, not an empty header
        if block.is_empty() && line.trim().is_empty() {
            continue;
        }
        block.push((index + 1, line));
    }

    if !block.is_empty() {
        events.push(convert_block(&block)?);
    }

    Ok(events)
}

fn convert_block(block: &[(usize, &str)]) -> Result<Event, ParseError> {
    let (id_line, id) = block[0];
    let (_, description) = block
        .get(1)
        .copied()
        .ok_or(ParseError::MissingHeader { line: id_line })?;

    let mut event = Event::new(id.trim(), description.trim());
    for &(line, content) in &block[2..] {
        let record = content.trim_start();
        if record.is_empty() {
            continue;
        }
        if record.starts_with("track") {
            event.tracks.push(parse_track(record, line)?);
        } else if record.starts_with("cluster") {
            event.clusters.push(parse_cluster(record, line)?);
        } else {
            return Err(ParseError::UnknownRecord {
                line,
                content: content.to_string(),
            });
        }
    }

    Ok(event)
}

fn split_record(content: &str, line: usize) -> Result<Vec<&str>, ParseError> {
    let columns: Vec<&str> = content.split_whitespace().collect();
    if columns.len() != RECORD_COLUMNS {
        return Err(ParseError::FieldCount {
            line,
            expected: RECORD_COLUMNS,
            found: columns.len(),
        });
    }
    Ok(columns)
}

fn number(value: &str, column: &'static str, line: usize) -> Result<f64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        column,
        value: value.to_string(),
    })
}

/// Parses one `track…` record.
pub fn parse_track(content: &str, line: usize) -> Result<ParticleTrack, ParseError> {
    let c = split_record(content, line)?;
    let true_kind: i32 = c[11].parse().map_err(|_| ParseError::InvalidNumber {
        line,
        column: "true_kind",
        value: c[11].to_string(),
    })?;

    Ok(ParticleTrack {
        id: c[0].to_string(),
        charge: ChargeMarker::new(c[1]),
        momentum: number(c[2], "p", line)?,
        transverse_momentum: number(c[3], "pT", line)?,
        phi: number(c[4], "phi", line)?,
        theta: number(c[5], "theta", line)?,
        eta: number(c[6], "eta", line)?,
        cot_theta: number(c[7], "cot_theta", line)?,
        true_kind,
        is_muon: true_kind == TRUE_KIND_MUON,
        interest_level: c[12].to_string(),
        entry: Vector3::new(
            number(c[13], "xmin", line)?,
            number(c[14], "ymin", line)?,
            number(c[15], "zmin", line)?,
        ),
        exit: Vector3::new(
            number(c[16], "xmax", line)?,
            number(c[17], "ymax", line)?,
            number(c[18], "zmax", line)?,
        ),
        extra: c[8..11].iter().map(|s| s.to_string()).collect(),
    })
}

/// Parses one `cluster…` record.
pub fn parse_cluster(content: &str, line: usize) -> Result<Cluster, ParseError> {
    let c = split_record(content, line)?;
    let extra = c[1..3]
        .iter()
        .chain(&c[7..])
        .map(|s| s.to_string())
        .collect();

    Ok(Cluster {
        id: c[0].to_string(),
        energy: number(c[3], "energy", line)?,
        phi: number(c[4], "phi", line)?,
        theta: number(c[5], "theta", line)?,
        eta: number(c[6], "eta", line)?,
        extra,
    })
}
