use manet_lab_abstract::{AggregateReport, FlowStatsSnapshot, ScenarioConfig};
use serde::Serialize;

use crate::flow_plan::FlowPlan;

/// Everything known about one run, kept at full precision.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedRecord<'a> {
    pub config: &'a ScenarioConfig,
    pub plan: &'a FlowPlan,
    pub flow_stats: &'a FlowStatsSnapshot,
    pub report: &'a AggregateReport,
}
