use crate::core::models::cell::{CellId, ID_COLUMN};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Missing column '{column}' in '{path}'")]
    MissingColumn { path: String, column: &'static str },

    #[error("Invalid value '{value}' in column '{column}' at line {line} of '{path}'")]
    InvalidValue {
        path: String,
        line: u64,
        column: String,
        value: String,
    },
}

/// An undirected adjacency between two cells, as listed in `neighbors.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct NeighborRelation {
    pub left: CellId,
    pub right: CellId,
}

/// A per-timepoint state table before it is merged into a run-wide schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTable {
    /// Numeric column names in file order, without the identifier column.
    pub columns: Vec<String>,
    pub rows: Vec<(CellId, Vec<f64>)>,
}

fn csv_error(path: &Path, source: csv::Error) -> TableError {
    TableError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

pub fn read_neighbors(path: &Path) -> Result<Vec<NeighborRelation>, TableError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;

    let mut relations = Vec::new();
    for result in reader.deserialize::<NeighborRelation>() {
        relations.push(result.map_err(|e| csv_error(path, e))?);
    }
    debug!("Read {} neighbor relations from {:?}", relations.len(), path);
    Ok(relations)
}

fn parse_level(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}

fn parse_id(raw: &str) -> Option<CellId> {
    let raw = raw.trim();
    raw.parse::<CellId>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= CellId::MAX as f64)
            .map(|v| v as CellId)
    })
}

pub fn read_states(path: &Path) -> Result<StateTable, TableError> {
    let path_str = || path.to_string_lossy().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;

    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let id_position = headers
        .iter()
        .position(|h| h.trim() == ID_COLUMN)
        .ok_or_else(|| TableError::MissingColumn {
            path: path_str(),
            column: ID_COLUMN,
        })?;
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_position)
        .map(|(_, h)| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_id = record.get(id_position).unwrap_or_default();
        let id = parse_id(raw_id).ok_or_else(|| TableError::InvalidValue {
            path: path_str(),
            line,
            column: ID_COLUMN.to_string(),
            value: raw_id.to_string(),
        })?;

        let mut values = Vec::with_capacity(columns.len());
        for (i, raw) in record.iter().enumerate() {
            if i == id_position {
                continue;
            }
            let value = parse_level(raw).ok_or_else(|| TableError::InvalidValue {
                path: path_str(),
                line,
                column: headers.get(i).unwrap_or_default().to_string(),
                value: raw.to_string(),
            })?;
            values.push(value);
        }
        rows.push((id, values));
    }

    debug!("Read {} cell rows from {:?}", rows.len(), path);
    Ok(StateTable { columns, rows })
}
