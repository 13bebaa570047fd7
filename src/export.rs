//! CSV serialization of a recorded session and delivery to a sink.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::session::DataPoint;

pub const CSV_HEADER: &str = "Timestamp_Seconds,Activation_Score,Spectral_Centroid,Spectral_Harshness,Dynamic_Variability,Temporal_Unpredictability,RMS_Level";

pub const DEFAULT_EXPORT_FILE_NAME: &str = "acoustic_data.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no data to export, record a session first")]
    NoData,

    #[error("failed to write export: {0}")]
    Write(#[from] io::Error),
}

/// Outcome of a successful export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub destination: String,
}

/// Destination for an exported table.
pub trait TableSink {
    fn deliver(&mut self, payload: &str) -> io::Result<()>;

    /// Human readable destination, used for status messages.
    fn describe(&self) -> String;
}

/// Replaces the file at `path` with the payload.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSink for FileSink {
    fn deliver(&mut self, payload: &str) -> io::Result<()> {
        fs::write(&self.path, payload)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Streams the payload into any writer (stdout, a socket, a buffer).
pub struct WriterSink<W: Write> {
    writer: W,
    name: String,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, name: impl Into<String>) -> Self {
        Self {
            writer,
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for WriterSink<W> {
    fn deliver(&mut self, payload: &str) -> io::Result<()> {
        self.writer.write_all(payload.as_bytes())?;
        self.writer.flush()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Header row plus one fixed-precision row per point, in order.
pub fn format_table(points: &[DataPoint]) -> String {
    // ~64 bytes per row
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + points.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for p in points {
        let _ = writeln!(
            out,
            "{:.3},{:.2},{:.4},{:.4},{:.4},{:.4},{:.6}",
            p.timestamp,
            p.activation_score,
            p.spectral_centroid,
            p.spectral_harshness,
            p.dynamic_variability,
            p.temporal_unpredictability,
            p.rms_level
        );
    }
    out
}

/// `<Documents>/acoustic_data.csv`, falling back to the home, then the temp directory.
pub fn default_export_path() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_EXPORT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64) -> DataPoint {
        DataPoint {
            timestamp: t,
            activation_score: 87.654_32,
            spectral_centroid: 0.123_456,
            spectral_harshness: 0.5,
            dynamic_variability: 0.0,
            temporal_unpredictability: 1.0,
            rms_level: 0.012_345_678,
        }
    }

    #[test]
    fn test_header_and_precision() {
        let table = format_table(&[point(1.23456), point(2.0)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1.235,87.65,0.1235,0.5000,0.0000,1.0000,0.012346");
        assert_eq!(lines[2], "2.000,87.65,0.1235,0.5000,0.0000,1.0000,0.012346");
        assert!(table.ends_with('\n'));
    }

    #[test]
    fn test_header_column_order() {
        let cols: Vec<&str> = CSV_HEADER.split(',').collect();
        assert_eq!(
            cols,
            vec![
                "Timestamp_Seconds",
                "Activation_Score",
                "Spectral_Centroid",
                "Spectral_Harshness",
                "Dynamic_Variability",
                "Temporal_Unpredictability",
                "RMS_Level",
            ]
        );
    }

    #[test]
    fn test_writer_sink_receives_payload() {
        let mut sink = WriterSink::new(Vec::new(), "buffer");
        sink.deliver("a,b\n").unwrap();
        assert_eq!(sink.describe(), "buffer");
        assert_eq!(sink.into_inner(), b"a,b\n".to_vec());
    }

    #[test]
    fn test_file_sink_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "acoustic_export_test_{}.csv",
            std::process::id()
        ));
        let mut sink = FileSink::new(&path);
        sink.deliver(CSV_HEADER).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CSV_HEADER);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_sink_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("acoustic_export_missing_dir")
            .join("nested")
            .join("out.csv");
        let mut sink = FileSink::new(path);
        assert!(sink.deliver("x").is_err());
    }

    #[test]
    fn test_default_path_file_name() {
        assert!(default_export_path().ends_with(DEFAULT_EXPORT_FILE_NAME));
    }
}
