use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod plan;
mod provenance;
mod scenario;

use provenance::{ensure_parent, write_sidecar, Provenance};
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "beamplan-cli")]
#[command(about = "Tangent-pair planning on the phantom host")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Plan a tangent pair and write the JSON report plus provenance sidecar
    Plan {
        /// Scenario JSON; defaults apply to every missing field
        #[arg(long)]
        scenario: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        /// Optional CSV trace of the gantry scan
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Plan {
            scenario,
            out,
            trace,
        } => plan_cmd(scenario.as_deref(), &out, trace.as_deref()),
        Action::Report => report(),
    }
}

fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    let Some(path) = path else {
        return Ok(Scenario::default());
    };
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn plan_cmd(scenario_path: Option<&Path>, out: &Path, trace: Option<&Path>) -> Result<()> {
    let scenario = load_scenario(scenario_path)?;
    tracing::info!(side = ?scenario.side, out = %out.display(), "plan");
    let run = plan::run_plan(&scenario)?;

    ensure_parent(out)?;
    fs::write(out, serde_json::to_vec_pretty(&run.report)?)
        .with_context(|| format!("writing {}", out.display()))?;

    let mut prov = Provenance::new("plan", serde_json::to_value(&scenario)?).with_output(out);
    if let Some(path) = scenario_path {
        prov = prov.with_input(path);
    }
    if let Some(path) = trace {
        ensure_parent(path)?;
        plan::write_trace(path, &run.trace)?;
        prov = prov.with_output(path);
    }
    let sidecar = write_sidecar(out, &prov)?;
    tracing::info!(
        gantry = run.report.medial.gantry_deg,
        max_dose_gy = run.report.weights.max_dose_gy,
        sidecar = %sidecar.display(),
        "plan written"
    );
    Ok(())
}

fn report() -> Result<()> {
    let prov = Provenance::new("report", serde_json::json!({}));
    println!("{}", serde_json::to_string_pretty(&prov)?);
    Ok(())
}
