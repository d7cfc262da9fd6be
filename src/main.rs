use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use band_scheduler::config::SchedulerConfig;
use band_scheduler::display::{
    print_audit, print_bands, print_schedule, write_schedule_json, write_schedule_to_file,
};
use band_scheduler::parser::load_bands;
use band_scheduler::schedule::{project, reduce, AssignmentResult, Solver};

fn init_logging(config: &SchedulerConfig) {
    // prefer RUST_LOG, fall back to BAND_SCHEDULER_LOG
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// One report line for the satisfied weight of an assignment run.
fn total_line(label: &str, result: &AssignmentResult) -> String {
    match result {
        AssignmentResult::Solved {
            total_weight,
            backend,
            ..
        } => format!("{label} total weight: {total_weight} ({backend})"),
        AssignmentResult::Unavailable { .. } => format!("{label} total weight: unavailable"),
    }
}

fn main() -> Result<()> {
    let mut config = SchedulerConfig::from_env().context("loading configuration")?;
    if let Some(path) = std::env::args().nth(1) {
        config.csv_path = path.into();
    }
    init_logging(&config);

    info!(
        festival = %config.festival.festival,
        venue = %config.festival.venue,
        days = config.festival.days.len(),
        csv = %config.csv_path.display(),
        "Band scheduler initialized"
    );

    let bands = load_bands(&config.csv_path, config.festival.year)
        .with_context(|| format!("reading preferences from {}", config.csv_path.display()))?;
    print_bands(&bands)?;

    let mut grid = config.festival.grid()?;
    let projection = project(&mut grid, &bands);
    if projection.unknown_day + projection.invalid_slot > 0 {
        warn!(
            unknown_day = projection.unknown_day,
            invalid_slot = projection.invalid_slot,
            "Some preferences do not match a festival slot"
        );
    }
    print_schedule("Candidacies", &grid)?;

    let reduction = reduce(&grid);
    print_audit(&reduction)?;

    let solver = Solver::from_kinds(&config.backends);
    info!(backends = ?solver.backend_names(), "Solving optimal assignment");
    let baseline = solver.solve(&grid);
    let reduced = solver.solve(&reduction.grid);

    match &reduced {
        AssignmentResult::Solved { total_weight, .. } => info!(
            baseline = ?baseline.total_weight(),
            after_reduction = total_weight,
            "Compared exact assignment with and without reduction"
        ),
        AssignmentResult::Unavailable { reason, .. } => {
            warn!(%reason, "Exact assignment of the reduced grid unavailable")
        }
    }
    println!("{}", total_line("Baseline", &baseline));
    println!("{}", total_line("After reduction", &reduced));

    let (assigned, total_weight) = match baseline {
        AssignmentResult::Solved {
            grid: assigned,
            total_weight,
            ..
        } => (assigned, total_weight),
        AssignmentResult::Unavailable { reason, .. } => {
            bail!("optimal assignment unavailable: {reason}")
        }
    };

    let title = format!("{} @ {}", config.festival.festival, config.festival.venue);
    print_schedule(&title, &assigned)?;
    println!("Total satisfied preference weight: {}", total_weight);

    write_schedule_to_file(&title, &assigned, &config.output_path)
        .with_context(|| format!("writing {}", config.output_path.display()))?;
    println!("Schedule saved to {}", config.output_path.display());
    if let Some(path) = &config.json_output_path {
        write_schedule_json(&assigned, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Schedule JSON saved to {}", path.display());
    }

    Ok(())
}
