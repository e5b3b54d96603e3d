//! Persisted time-series log
//!
//! One reading per CSV row, the whole retained series per file. The producer
//! rewrites the file after every tick by writing a temporary sibling and
//! renaming it over the log, so readers never observe a partial write.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use log::debug;
use thiserror_no_std::Error;

use smartfloors_core::readings::{FloorId, Reading};

/// Column header of the log
pub const HEADER: &str = "timestamp,building,floor,temp_C,humidity_pct,energy_kW";

/// Timestamp format written to the log (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Formats accepted on read, besides RFC 3339
const ACCEPTED_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("No data available yet")]
    DataUnavailable,
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
    #[error("I/O error: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for LogError {
    fn from(err: io::Error) -> Self {
        LogError::Io(err.kind())
    }
}

/// Path of the temporary file used while rewriting `path`
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

pub fn format_timestamp(timestamp: u32) -> String {
    match DateTime::from_timestamp(timestamp as i64, 0) {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

/// Parse a log timestamp into epoch seconds
///
/// Naive timestamps are taken as UTC. Plain epoch seconds are accepted too.
pub fn parse_timestamp(text: &str) -> Option<u32> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return u32::try_from(dt.timestamp()).ok();
    }
    for format in ACCEPTED_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return u32::try_from(naive.and_utc().timestamp()).ok();
        }
    }
    text.parse().ok()
}

/// Replace the log at `path` with `readings`
///
/// Fields are written unquoted; `Config::validate` keeps building names free
/// of separators.
pub fn write_atomic<'a>(
    path: &Path,
    readings: impl IntoIterator<Item = &'a Reading>,
) -> Result<(), LogError> {
    let tmp = tmp_path(path);

    {
        let mut out = BufWriter::new(File::create(&tmp)?);
        writeln!(out, "{}", HEADER)?;

        let mut rows = 0usize;
        for r in readings {
            writeln!(
                out,
                "{},{},{},{:.2},{:.2},{:.2}",
                format_timestamp(r.timestamp),
                r.building,
                r.floor,
                r.temperature_c,
                r.humidity_pct,
                r.energy_kw
            )?;
            rows += 1;
        }
        out.flush()?;
        debug!("Wrote {} rows to {}", rows, tmp.display());
    }

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read every reading from the log at `path`
///
/// A missing file, an empty file and a header-only file are all
/// `DataUnavailable`. Any bad row discards the whole read.
pub fn read_log(path: &Path) -> Result<Vec<Reading>, LogError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LogError::DataUnavailable),
        Err(e) => return Err(e.into()),
    };

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    match lines.next() {
        None => return Err(LogError::DataUnavailable),
        Some((_, line)) if line == HEADER => {}
        Some((line, _)) => {
            return Err(LogError::MalformedRecord {
                line,
                reason: String::from("missing header"),
            });
        }
    }

    let readings = lines
        .map(|(line, text)| {
            parse_record(text).map_err(|reason| LogError::MalformedRecord { line, reason })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if readings.is_empty() {
        return Err(LogError::DataUnavailable);
    }
    Ok(readings)
}

fn parse_record(line: &str) -> Result<Reading, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [timestamp, building, floor, temperature, humidity, energy] = fields.as_slice() else {
        return Err(format!("expected 6 fields, found {}", fields.len()));
    };

    let timestamp =
        parse_timestamp(timestamp).ok_or_else(|| format!("invalid timestamp '{}'", timestamp))?;
    let floor: FloorId = floor
        .parse()
        .map_err(|_| format!("invalid floor '{}'", floor))?;

    Ok(Reading::new(
        timestamp,
        *building,
        floor,
        parse_value("temp_C", temperature)?,
        parse_value("humidity_pct", humidity)?,
        parse_value("energy_kW", energy)?,
    ))
}

fn parse_value(column: &str, text: &str) -> Result<f32, String> {
    match text.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("invalid {} '{}'", column, text)),
    }
}
