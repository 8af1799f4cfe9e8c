use anyhow::{Context, Result};
use manet_lab_abstract::{
    AggregateReport, LabError, RunOutcome, ScenarioConfig, SimulationEngine,
};
use tracing::{info, warn};

use crate::aggregator::aggregate;
use crate::flow_plan::FlowPlan;
use crate::report_writer::ReportWriter;
use crate::trace::DetailedRecord;

/// Run one comparison: plan the flows, drive the engine to completion,
/// reduce its counters and persist the result.
///
/// Nothing is aggregated or written unless the engine completes the run.
pub fn run_scenario(
    config: &ScenarioConfig,
    engine: &mut dyn SimulationEngine,
    writer: &ReportWriter,
) -> Result<AggregateReport> {
    let plan = FlowPlan::new(config).context("Failed to plan traffic flows")?;

    info!(
        "Running {} with {} nodes, {} flows of {} byte packets at {} for {}s",
        config.protocol(),
        config.node_count(),
        config.flow_count(),
        config.packet_size(),
        plan.rate_label(),
        config.sim_duration()
    );

    engine
        .install_routing(config.protocol(), config.node_count())
        .context("Failed to install routing protocol")?;
    plan.install(engine).context("Failed to install traffic")?;

    let flow_stats = match engine.run(config.sim_duration()) {
        RunOutcome::Completed(snapshot) => snapshot,
        RunOutcome::Incomplete { reason } => {
            warn!("Simulation halted early, skipping aggregation");
            return Err(LabError::RunIncomplete(reason).into());
        }
    };
    info!("Simulation complete, {} flows observed", flow_stats.len());

    let report =
        aggregate(config, flow_stats.iter()).context("Failed to aggregate flow statistics")?;
    writer
        .persist(&DetailedRecord {
            config,
            plan: &plan,
            flow_stats: &flow_stats,
            report: &report,
        })
        .context("Failed to record comparison run")?;

    Ok(report)
}
