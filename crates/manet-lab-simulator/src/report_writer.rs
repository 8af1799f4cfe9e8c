use manet_lab_abstract::{AggregateReport, LabError, RoutingProtocol};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::trace::DetailedRecord;

pub const CSV_HEADER: &str = "Protocol,Nodes,Flows,TotalTx,TotalRx,Throughput (Mbps),Average Delay (s),Packet Delivery Ratio (%)";

pub const DEFAULT_RESULTS_LOG: &str = "manet-results.csv";

/// Persists run results: one row per run in a shared CSV log, plus one JSON
/// record per protocol holding the latest run in full.
///
/// The log is shared between independent processes, so whether it still
/// needs a header is decided from the file itself on every append.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    results_log: PathBuf,
    record_dir: PathBuf,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_LOG, ".")
    }
}

impl ReportWriter {
    pub fn new(results_log: impl Into<PathBuf>, record_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_log: results_log.into(),
            record_dir: record_dir.into(),
        }
    }

    pub fn results_log(&self) -> &Path {
        &self.results_log
    }

    /// Where the detailed record for `protocol` lives. Reruns overwrite it.
    pub fn record_path(&self, protocol: RoutingProtocol) -> PathBuf {
        self.record_dir
            .join(format!("manet-results-{}.json", protocol.as_str()))
    }

    /// Write the detailed record, then the CSV row for a finished run.
    ///
    /// The shared log only gains a row once the record is on disk.
    pub fn persist(&self, record: &DetailedRecord<'_>) -> Result<(), LabError> {
        let record_path = self.write_record(record)?;
        self.append_row(record.report)?;
        info!(
            "Results appended to {} and detailed record written to {}",
            self.results_log.display(),
            record_path.display()
        );
        Ok(())
    }

    pub fn append_row(&self, report: &AggregateReport) -> Result<(), LabError> {
        let path = &self.results_log;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LabError::persistence(path, e))?;
        let needs_header = file
            .metadata()
            .map_err(|e| LabError::persistence(path, e))?
            .len()
            == 0;

        let mut writer = BufWriter::new(file);
        if needs_header {
            debug!("Starting new results log at {}", path.display());
            writeln!(writer, "{CSV_HEADER}").map_err(|e| LabError::persistence(path, e))?;
        }
        writeln!(writer, "{}", csv_row(report)).map_err(|e| LabError::persistence(path, e))?;
        writer.flush().map_err(|e| LabError::persistence(path, e))
    }

    pub fn write_record(&self, record: &DetailedRecord<'_>) -> Result<PathBuf, LabError> {
        let path = self.record_path(record.report.protocol);
        let data =
            serde_json::to_vec_pretty(record).map_err(|e| LabError::persistence(&path, e))?;
        fs::write(&path, &data).map_err(|e| LabError::persistence(&path, e))?;
        Ok(path)
    }
}

fn csv_row(report: &AggregateReport) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        report.protocol,
        report.node_count,
        report.flow_count,
        report.total_tx,
        report.total_rx,
        report.throughput_mbps,
        report.avg_delay_seconds,
        report.pdr_percent
    )
}
