//! CSV readings loader.
//!
//! Reads a table with one row per step and picks the configured columns by
//! header name. Empty cells count as missing and are resolved by the
//! [normalizer](crate::normalize).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::info;

use crate::balance::{MeterReadings, PvArray};
use crate::config::ReadingsConfig;
use crate::normalize::normalize;

/// Failure while loading a readings table.
#[derive(Debug, Error)]
pub enum ReadingsError {
    #[error("cannot open readings file \"{path}\": {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("column \"{0}\" not found in header")]
    MissingColumn(String),
    #[error("column \"{column}\" row {row}: cannot parse \"{value}\" as a number")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },
}

/// Loads meter readings from a CSV file.
///
/// # Errors
///
/// Returns [`ReadingsError`] if the file cannot be opened, a configured
/// column is missing or a cell is not numeric.
pub fn load_readings(path: &Path, cfg: &ReadingsConfig) -> Result<MeterReadings, ReadingsError> {
    let file = File::open(path).map_err(|source| ReadingsError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let readings = read_readings(file, cfg)?;
    info!(path = %path.display(), steps = readings.len(), "readings loaded");
    Ok(readings)
}

/// Reads meter readings from any CSV source.
///
/// # Errors
///
/// See [`load_readings`].
pub fn read_readings(reader: impl Read, cfg: &ReadingsConfig) -> Result<MeterReadings, ReadingsError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut columns = vec![cfg.import_column.as_str(), cfg.export_column.as_str()];
    columns.extend(cfg.pv.iter().map(|p| p.column.as_str()));
    let indices = columns
        .iter()
        .map(|name| column_index(&headers, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut raw: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        for ((series, &idx), name) in raw.iter_mut().zip(&indices).zip(&columns) {
            series.push(parse_cell(record.get(idx).unwrap_or(""), name, row + 1)?);
        }
    }

    let mut series = raw
        .iter()
        .map(|values| normalize(values, cfg.cumulative));
    let grid_import_kwh = series.next().unwrap_or_default();
    let grid_export_kwh = series.next().unwrap_or_default();
    let pv_arrays = cfg
        .pv
        .iter()
        .zip(series)
        .map(|(sensor, yield_kwh)| PvArray::new(sensor.column.clone(), yield_kwh, sensor.scale))
        .collect();

    Ok(MeterReadings {
        grid_import_kwh,
        grid_export_kwh,
        pv_arrays,
    })
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, ReadingsError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReadingsError::MissingColumn(name.to_string()))
}

fn parse_cell(cell: &str, column: &str, row: usize) -> Result<f64, ReadingsError> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|_| ReadingsError::InvalidValue {
        column: column.to_string(),
        row,
        value: cell.to_string(),
    })
}
