use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use manet_lab_abstract::{ConfigOverride, ScenarioConfig};
use manet_lab_simulator::{
    DEFAULT_RESULTS_LOG, FlowPlan, ReplayEngine, ReportWriter, ResultsHistory, run_scenario,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "MANET routing protocol comparison harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan the flows, replay a recorded run and append its metrics to the results log
    Run(RunOpt),
    /// Print the flow plan for a scenario without running anything
    Plan(ScenarioOpt),
    /// Compare protocols across the runs accumulated in the results log
    Compare(CompareOpt),
}

#[derive(Args, Debug)]
struct ScenarioOpt {
    /// TOML scenario file. Flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Routing protocol: aodv, dsdv, dsr, olsr
    #[arg(long)]
    protocol: Option<String>,

    /// Number of nodes
    #[arg(long = "nWifis")]
    n_wifis: Option<u32>,

    /// Number of flows
    #[arg(long = "nFlows")]
    n_flows: Option<u32>,

    /// Packet size in bytes
    #[arg(long = "packetSize")]
    packet_size: Option<u32>,

    /// Simulation time in seconds
    #[arg(long = "simTime")]
    sim_time: Option<f64>,

    /// Traffic rate per flow (Mbps)
    #[arg(long = "dataRate")]
    data_rate: Option<f64>,
}

#[derive(Args, Debug)]
struct RunOpt {
    #[command(flatten)]
    scenario: ScenarioOpt,

    /// Flow-monitor snapshot (JSON) recorded by the simulator
    #[arg(long)]
    stats: PathBuf,

    /// Results log shared by every run
    #[arg(long, default_value = DEFAULT_RESULTS_LOG)]
    results_log: PathBuf,

    /// Directory for the per-protocol detailed records
    #[arg(long, default_value = ".")]
    record_dir: PathBuf,
}

#[derive(Args, Debug)]
struct CompareOpt {
    #[arg(long, default_value = DEFAULT_RESULTS_LOG)]
    results_log: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt::init();
    info!("manet-lab starting…");

    match cli.command {
        Command::Run(opt) => run(&opt),
        Command::Plan(opt) => plan(&opt),
        Command::Compare(opt) => compare(&opt),
    }
}

impl ScenarioOpt {
    fn overrides(&self) -> ConfigOverride {
        ConfigOverride {
            protocol: self.protocol.clone(),
            n_wifis: self.n_wifis,
            n_flows: self.n_flows,
            packet_size: self.packet_size,
            sim_time: self.sim_time,
            data_rate: self.data_rate,
        }
    }

    fn resolve(&self) -> Result<ScenarioConfig> {
        let base = match &self.config {
            Some(path) => load_overrides(path)?,
            None => ConfigOverride::default(),
        };
        let config = base
            .merge(self.overrides())
            .resolve()
            .context("Invalid scenario")?;
        Ok(config)
    }
}

fn load_overrides(path: &Path) -> Result<ConfigOverride> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let overrides: ConfigOverride =
        toml::from_str(&content).context("Failed to parse scenario file")?;
    Ok(overrides)
}

fn run(opt: &RunOpt) -> Result<()> {
    let config = opt.scenario.resolve()?;
    let mut engine = ReplayEngine::from_path(&opt.stats)?;
    let writer = ReportWriter::new(&opt.results_log, &opt.record_dir);

    let report = run_scenario(&config, &mut engine, &writer)?;
    println!("\n{report}");
    Ok(())
}

fn plan(opt: &ScenarioOpt) -> Result<()> {
    let config = opt.resolve()?;
    let plan = FlowPlan::new(&config)?;
    let (start, stop) = plan.active_window();

    println!("--- Scenario ---");
    println!(
        "* Protocol: {} ({})",
        config.protocol(),
        if config.protocol().is_proactive() {
            "proactive"
        } else {
            "reactive"
        }
    );
    println!("* Nodes: {}  Flows: {}", config.node_count(), config.flow_count());
    println!("* Packet size: {} bytes", config.packet_size());
    println!("* Traffic active from {start}s to {stop}s");
    println!(
        "* Expected packets per flow ≈ {}  -> total ≈ {}",
        plan.expected_tx_per_flow(),
        plan.expected_tx_total()
    );
    println!("--- Flows ---");
    for flow in plan.flows() {
        println!("* {flow}");
    }
    Ok(())
}

fn compare(opt: &CompareOpt) -> Result<()> {
    let history = ResultsHistory::load(&opt.results_log)?;
    if history.rows().is_empty() {
        println!("No runs recorded in {}", opt.results_log.display());
        return Ok(());
    }
    write_comparison(&history, &mut io::stdout().lock())?;
    Ok(())
}

fn write_comparison(history: &ResultsHistory, out: &mut impl Write) -> io::Result<()> {
    for protocol in history.protocols() {
        writeln!(out, "--- {} ---", protocol.as_str().to_uppercase())?;
        writeln!(
            out,
            "{:>6} {:>6} {:>10} {:>18} {:>12}",
            "Nodes", "Flows", "PDR (%)", "Throughput (Mbps)", "Delay (s)"
        )?;
        for row in history.series(protocol) {
            writeln!(
                out,
                "{:>6} {:>6} {:>10.2} {:>18.4} {:>12.4}",
                row.node_count,
                row.flow_count,
                row.pdr_percent,
                row.throughput_mbps,
                row.avg_delay_seconds
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use manet_lab_abstract::RoutingProtocol;

    #[test]
    fn command_line_overrides_scenario_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("scenario.toml");
        fs::write(&path, "protocol = \"dsr\"\nnWifis = 20\nsimTime = 60.0\n").unwrap();

        let cli = Cli::try_parse_from([
            "manet-lab",
            "plan",
            "--config",
            path.to_str().unwrap(),
            "--nWifis",
            "30",
            "--dataRate",
            "2.0",
        ])
        .unwrap();
        let Command::Plan(opt) = cli.command else {
            panic!("expected plan subcommand");
        };

        let config = opt.resolve().unwrap();
        assert_eq!(config.protocol(), RoutingProtocol::Dsr);
        assert_eq!(config.node_count(), 30);
        assert_eq!(config.sim_duration(), 60.0);
        assert_eq!(config.data_rate_mbps(), 2.0);
        assert_eq!(config.flow_count(), 10);
    }

    #[test]
    fn unknown_protocol_fails_to_resolve() {
        let cli = Cli::try_parse_from([
            "manet-lab",
            "run",
            "--protocol",
            "babel",
            "--stats",
            "snapshot.json",
        ])
        .unwrap();
        let Command::Run(opt) = cli.command else {
            panic!("expected run subcommand");
        };
        assert!(opt.scenario.resolve().is_err());
        assert_eq!(opt.results_log, PathBuf::from(DEFAULT_RESULTS_LOG));
    }

    #[test]
    fn bundled_scenarios_run_end_to_end() {
        let scenarios = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios");
        let overrides = load_overrides(&scenarios.join("dense-olsr.toml")).unwrap();
        let config = overrides.resolve().unwrap();
        assert_eq!(config.protocol(), RoutingProtocol::Olsr);
        assert_eq!(config.node_count(), 80);

        let dir = tempfile::tempdir().expect("create temp dir");
        let opt = RunOpt {
            scenario: ScenarioOpt {
                config: None,
                protocol: Some("aodv".into()),
                n_wifis: None,
                n_flows: None,
                packet_size: None,
                sim_time: None,
                data_rate: None,
            },
            stats: scenarios.join("aodv-snapshot.json"),
            results_log: dir.path().join("manet-results.csv"),
            record_dir: dir.path().to_path_buf(),
        };
        run(&opt).unwrap();

        let history = ResultsHistory::load(&opt.results_log).unwrap();
        let row = &history.rows()[0];
        assert_eq!(row.total_tx, 3 * 2312);
        assert_eq!(row.total_rx, 2198 + 2040);
        assert!(dir.path().join("manet-results-aodv.json").exists());
    }

    #[test]
    fn run_requires_a_snapshot() {
        assert!(Cli::try_parse_from(["manet-lab", "run", "--protocol", "aodv"]).is_err());
    }

    #[test]
    fn compare_groups_logged_runs_by_protocol() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let log = dir.path().join("manet-results.csv");
        fs::write(
            &log,
            format!(
                "{}\nolsr,50,10,100,90,0.0048,0.1,90\naodv,80,10,100,80,0.0043,0.2,80\n\
                 aodv,20,10,100,95,0.0051,0.05,95\n",
                manet_lab_simulator::CSV_HEADER
            ),
        )
        .unwrap();

        let opt = CompareOpt { results_log: log };
        compare(&opt).unwrap();

        let history = ResultsHistory::load(&opt.results_log).unwrap();
        let mut out = Vec::new();
        write_comparison(&history, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "--- AODV ---");
        assert!(lines[2].trim_start().starts_with("20"));
        assert!(lines[3].trim_start().starts_with("80"));
        assert_eq!(lines[4], "--- OLSR ---");
        assert!(lines[6].contains("90.00"));
    }

    #[test]
    fn compare_accepts_an_empty_log() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let log = dir.path().join("manet-results.csv");
        fs::write(&log, "").unwrap();
        compare(&CompareOpt { results_log: log }).unwrap();
    }

    #[test]
    fn compare_reports_a_missing_log() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let opt = CompareOpt {
            results_log: dir.path().join("absent.csv"),
        };
        assert!(compare(&opt).is_err());
    }
}
