// Library exports for chartforge

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod infer;
pub mod server;
pub mod suggest;
pub mod task;

use serde::Serialize;
use std::fmt;

/// Supported chart types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    /// Parse a chart type name from a request payload.
    pub fn from_name(name: &str) -> Option<ChartKind> {
        match name {
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            "pie" => Some(ChartKind::Pie),
            _ => None,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Line => write!(f, "line"),
            ChartKind::Pie => write!(f, "pie"),
        }
    }
}
