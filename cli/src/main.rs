use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use labdash_api::summarize_bundle_str;
use labdash_core::kpi::{format_delta, format_value};
use labdash_core::{DashboardConfig, DashboardSnapshot, ParameterPanel, ViewState};
use log::warn;

#[derive(Parser, Debug)]
#[command(
    name = "labdash",
    version,
    about = "Resumen de parámetros de laboratorio a partir de un bundle JSON."
)]
struct Args {
    /// Path to the JSON bundle (`parameters`, `ranges`, `timeline`).
    #[arg(short, long)]
    input: PathBuf,

    /// Print the whole snapshot as JSON instead of the text summary.
    #[arg(long)]
    json: bool,

    /// Treatment length when neither the record nor the payload sets one.
    #[arg(long)]
    default_days: Option<u32>,

    #[arg(long)]
    step_px: Option<f64>,

    #[arg(long)]
    pad_days: Option<u32>,

    #[arg(long)]
    horizon_days: Option<u32>,

    /// Start of the zoom window, `YYYY-MM-DD`.
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// End of the zoom window, `YYYY-MM-DD`.
    #[arg(long, requires = "from")]
    to: Option<String>,
}

impl Args {
    fn config(&self) -> DashboardConfig {
        let mut config = DashboardConfig::default();
        if let Some(days) = self.default_days {
            config.treatment_default_days = Some(days);
        }
        if let Some(step) = self.step_px {
            config.annotation_step_px = step;
        }
        if let Some(days) = self.pad_days {
            config.extent_pad_days = days;
        }
        if let Some(days) = self.horizon_days {
            config.extent_horizon_days = days;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("No se pudo leer el archivo {:?}", args.input))?;

    let config = args.config();
    let snapshot = summarize_bundle_str(&data, &config)
        .inspect_err(|err| warn!("{:?}: {err}", args.input))
        .with_context(|| format!("Bundle inválido en {:?}", args.input))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_summary(&snapshot);

    if let (Some(from), Some(to)) = (args.from.as_deref(), args.to.as_deref()) {
        let mut view = ViewState::new(snapshot.extent);
        if view.apply_date_range(from, to) {
            if let Some(hint) = view.zoom_hint() {
                println!("{hint}");
            }
        } else {
            warn!("zoom window {from} → {to} ignored");
        }
    }

    Ok(())
}

fn print_summary(snapshot: &DashboardSnapshot) {
    println!(
        "Generated at: {}\nParameters: {}\nAlerts: {}\nCrossings: {}\nTimeline markers: {}",
        snapshot.generated_at,
        snapshot.panels.len(),
        snapshot.alert_total(),
        snapshot.crossing_total(),
        snapshot.markers.len()
    );

    for panel in &snapshot.panels {
        println!("{}", panel_line(panel));
        for crossing in &panel.crossings {
            let during = crossing
                .treatments
                .iter()
                .map(|t| format!("{} D+{}", t.name, t.day))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {} {} {}",
                crossing.direction.arrow(),
                crossing.date_iso,
                during
            );
        }
    }

    for summary in &snapshot.treatment_summaries {
        println!("{}: {}", summary.name, summary.subtitle());
        for crossing in &summary.crossings {
            println!(
                "  {} {} {} (D+{})",
                crossing.param_key,
                crossing.direction.arrow(),
                crossing.date_iso,
                crossing.day
            );
        }
    }
}

fn panel_line(panel: &ParameterPanel) -> String {
    let kpi = &panel.kpi;
    let last = match panel.unit.as_deref() {
        Some(unit) => format!("{} {unit}", format_value(kpi.last_value)),
        None => format_value(kpi.last_value),
    };
    format!(
        "{} [{}]: {} · {} · {} · rango {} · alertas {}",
        panel.label,
        panel.key,
        last,
        format_delta(kpi.delta),
        kpi.status.label(),
        kpi.range_text,
        kpi.alert_count
    )
}
