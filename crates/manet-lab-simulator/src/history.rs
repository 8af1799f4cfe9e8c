use anyhow::{Context, Result};
use manet_lab_abstract::{AggregateReport, LabError, RoutingProtocol};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::report_writer::CSV_HEADER;

/// Rows accumulated in the results log across runs and protocols.
#[derive(Debug, Clone, Default)]
pub struct ResultsHistory {
    rows: Vec<AggregateReport>,
}

impl ResultsHistory {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read results log {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse results log {}", path.display()))
    }

    /// Parse the log contents. Blank lines and repeated header rows are skipped.
    pub fn parse(content: &str) -> Result<Self, LabError> {
        let mut rows = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line == CSV_HEADER {
                continue;
            }
            rows.push(parse_row(idx + 1, line)?);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[AggregateReport] {
        &self.rows
    }

    /// Protocols present in the log, in enum order.
    pub fn protocols(&self) -> Vec<RoutingProtocol> {
        let mut protocols: Vec<_> = self.rows.iter().map(|r| r.protocol).collect();
        protocols.sort();
        protocols.dedup();
        protocols
    }

    /// Runs of one protocol ordered by node count; runs with the same node
    /// count keep their log order.
    pub fn series(&self, protocol: RoutingProtocol) -> Vec<&AggregateReport> {
        let mut series: Vec<_> = self.rows.iter().filter(|r| r.protocol == protocol).collect();
        series.sort_by_key(|r| r.node_count);
        series
    }
}

fn parse_row(line: usize, text: &str) -> Result<AggregateReport, LabError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != 8 {
        return Err(LabError::MalformedResultsLog {
            line,
            reason: format!("expected 8 columns, found {}", fields.len()),
        });
    }

    let protocol = fields[0]
        .parse::<RoutingProtocol>()
        .map_err(|e| LabError::MalformedResultsLog {
            line,
            reason: e.to_string(),
        })?;

    Ok(AggregateReport {
        protocol,
        node_count: field(line, "Nodes", fields[1])?,
        flow_count: field(line, "Flows", fields[2])?,
        total_tx: field(line, "TotalTx", fields[3])?,
        total_rx: field(line, "TotalRx", fields[4])?,
        throughput_mbps: field(line, "Throughput", fields[5])?,
        avg_delay_seconds: field(line, "Average Delay", fields[6])?,
        pdr_percent: field(line, "Packet Delivery Ratio", fields[7])?,
    })
}

fn field<T: FromStr>(line: usize, column: &str, value: &str) -> Result<T, LabError> {
    value.parse().map_err(|_| LabError::MalformedResultsLog {
        line,
        reason: format!("invalid {column} value '{value}'"),
    })
}
