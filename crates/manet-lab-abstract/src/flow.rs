use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// One planned traffic generator/sink pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// Position in the plan, starting at 0.
    pub index: u32,
    pub source_node: u32,
    pub dest_node: u32,
    /// Destination port, unique per flow.
    pub port: u16,
    /// Offered rate, e.g. `128kbps` or `2Mbps`.
    pub rate_label: String,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Flow {}: src={} dst={} port={} rate={}",
            self.index, self.source_node, self.dest_node, self.port, self.rate_label
        )
    }
}

/// Identifier the simulation engine assigns to an observed flow.
///
/// Unrelated to [`Flow::index`]: the engine may observe traffic that was not
/// planned (routing control messages, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub u32);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivery counters for one observed flow, filled in by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStats {
    pub tx_packets: u64,
    /// Usually `<= tx_packets`; duplicate delivery can break that and is
    /// accepted as-is.
    pub rx_packets: u64,
    pub rx_bytes: u64,
    /// Sum of end-to-end delays over every received packet.
    #[serde(rename = "delay_sum_secs", with = "duration_secs")]
    pub delay_sum: Duration,
    #[serde(default)]
    pub tx_bytes: u64,
    #[serde(default)]
    pub lost_packets: u64,
}

impl FlowStats {
    /// Mean per-packet delay in seconds, if anything was received.
    pub fn mean_delay_secs(&self) -> Option<f64> {
        (self.rx_packets > 0).then(|| self.delay_sum.as_secs_f64() / self.rx_packets as f64)
    }
}

/// Read-only view of every flow the engine observed during a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowStatsSnapshot {
    flows: BTreeMap<FlowId, FlowStats>,
}

impl FlowStatsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: FlowId, stats: FlowStats) {
        self.flows.insert(id, stats);
    }

    pub fn get(&self, id: FlowId) -> Option<&FlowStats> {
        self.flows.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlowId, &FlowStats)> {
        self.flows.iter().map(|(id, stats)| (*id, stats))
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl FromIterator<(FlowId, FlowStats)> for FlowStatsSnapshot {
    fn from_iter<T: IntoIterator<Item = (FlowId, FlowStats)>>(iter: T) -> Self {
        Self {
            flows: iter.into_iter().collect(),
        }
    }
}

/// Durations stored as fractional seconds in documents.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_delay_requires_received_packets() {
        let idle = FlowStats {
            tx_packets: 10,
            delay_sum: Duration::from_secs(1),
            ..Default::default()
        };
        assert_eq!(idle.mean_delay_secs(), None);

        let busy = FlowStats {
            tx_packets: 100,
            rx_packets: 90,
            rx_bytes: 90_000,
            delay_sum: Duration::from_secs(9),
            ..Default::default()
        };
        let mean = busy.mean_delay_secs().unwrap();
        assert!((mean - 0.1).abs() < 1e-12);
    }

    #[test]
    fn snapshot_document_uses_numeric_keys_and_seconds() {
        let json = r#"{
            "1": { "tx_packets": 100, "rx_packets": 90, "rx_bytes": 90000, "delay_sum_secs": 9.0 },
            "2": { "tx_packets": 0, "rx_packets": 0, "rx_bytes": 0, "delay_sum_secs": 0.0, "lost_packets": 3 }
        }"#;
        let snapshot: FlowStatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 2);
        let first = snapshot.get(FlowId(1)).unwrap();
        assert_eq!(first.delay_sum, Duration::from_secs(9));
        assert_eq!(first.tx_bytes, 0);
        assert_eq!(snapshot.get(FlowId(2)).unwrap().lost_packets, 3);
    }

    #[test]
    fn negative_delay_is_rejected() {
        let json = r#"{ "1": { "tx_packets": 1, "rx_packets": 1, "rx_bytes": 1, "delay_sum_secs": -1.0 } }"#;
        assert!(serde_json::from_str::<FlowStatsSnapshot>(json).is_err());
    }

    #[test]
    fn flow_display_matches_install_log() {
        let flow = Flow {
            index: 3,
            source_node: 3,
            dest_node: 46,
            port: 9003,
            rate_label: "128kbps".into(),
        };
        assert_eq!(flow.to_string(), "Flow 3: src=3 dst=46 port=9003 rate=128kbps");
    }
}
