use serde::{Deserialize, Serialize};
use std::fmt;

use crate::protocol::RoutingProtocol;

/// Reduced metrics of one run: the unit of output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub protocol: RoutingProtocol,
    pub node_count: u32,
    pub flow_count: u32,
    pub total_tx: u64,
    pub total_rx: u64,
    pub throughput_mbps: f64,
    pub avg_delay_seconds: f64,
    pub pdr_percent: f64,
}

/// Console summary block.
impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========================================")?;
        writeln!(f, "Protocol: {}", self.protocol)?;
        writeln!(f, "  Nodes: {}  Flows: {}", self.node_count, self.flow_count)?;
        writeln!(f, "  Total Tx: {}", self.total_tx)?;
        writeln!(f, "  Total Rx: {}", self.total_rx)?;
        writeln!(f, "  Aggregate Throughput: {} Mbps", self.throughput_mbps)?;
        writeln!(f, "  Avg Delay: {} s", self.avg_delay_seconds)?;
        writeln!(f, "  Overall PDR: {} %", self.pdr_percent)?;
        write!(f, "========================================")
    }
}
