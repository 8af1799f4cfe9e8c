use manet_lab_abstract::{AggregateReport, FlowId, FlowStats, LabError, ScenarioConfig};
use tracing::{debug, warn};

/// Reduce per-flow counters into a single [`AggregateReport`].
///
/// Flows that never transmitted are left out entirely. Delay is the mean of
/// the per-flow mean delays over flows that received at least one packet.
/// Throughput is measured over the full nominal duration, warm-up included.
///
/// The result does not depend on the iteration order of `stats`. Fails with
/// [`LabError::CounterOverflow`] when the packet or byte totals do not fit.
pub fn aggregate<'a, I>(config: &ScenarioConfig, stats: I) -> Result<AggregateReport, LabError>
where
    I: IntoIterator<Item = (FlowId, &'a FlowStats)>,
{
    let mut total_tx: u64 = 0;
    let mut total_rx: u64 = 0;
    let mut total_rx_bytes: u64 = 0;
    let mut flow_delays = Vec::new();
    let mut active_flows = 0usize;
    let mut idle_flows = 0usize;

    for (id, flow) in stats {
        if flow.tx_packets == 0 {
            idle_flows += 1;
            continue;
        }

        if flow.rx_packets > flow.tx_packets {
            warn!(
                "Flow {id} received more packets than it sent (tx={} rx={}), keeping counters as reported",
                flow.tx_packets, flow.rx_packets
            );
        }

        active_flows += 1;
        total_tx = checked_sum(total_tx, flow.tx_packets, "tx packet", id)?;
        total_rx = checked_sum(total_rx, flow.rx_packets, "rx packet", id)?;
        total_rx_bytes = checked_sum(total_rx_bytes, flow.rx_bytes, "rx byte", id)?;

        if let Some(delay) = flow.mean_delay_secs() {
            flow_delays.push(delay);
        }
    }

    // Float addition is not associative; sum in a fixed order
    flow_delays.sort_by(f64::total_cmp);
    let counted_flows = flow_delays.len();
    let avg_delay_seconds = if counted_flows > 0 {
        flow_delays.iter().sum::<f64>() / counted_flows as f64
    } else {
        0.0
    };

    let throughput_mbps = (total_rx_bytes as f64 * 8.0) / (config.sim_duration() * 1e6);
    let pdr_percent = if total_tx > 0 {
        (total_rx as f64 / total_tx as f64) * 100.0
    } else {
        0.0
    };

    debug!(
        "Aggregated {} active flows ({} with deliveries, {} idle)",
        active_flows, counted_flows, idle_flows
    );

    Ok(AggregateReport {
        protocol: config.protocol(),
        node_count: config.node_count(),
        flow_count: config.flow_count(),
        total_tx,
        total_rx,
        throughput_mbps,
        avg_delay_seconds,
        pdr_percent,
    })
}

fn checked_sum(
    total: u64,
    value: u64,
    counter: &'static str,
    flow: FlowId,
) -> Result<u64, LabError> {
    total
        .checked_add(value)
        .ok_or(LabError::CounterOverflow { counter, flow })
}
