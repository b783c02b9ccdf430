//! bathyzone CLI - depth-stratified habitat protection accounting

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use bathyzone_algorithms::gapfill::{fill_gaps, GapFillParams};
use bathyzone_algorithms::habitat::{check_alignment, run_vintages, ProtectionLayer, RegionSet};
use bathyzone_core::io::{read_geotiff, read_layer, write_geotiff};
use bathyzone_core::{FeatureCollection, Raster, CRS};

use config::RunConfig;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bathyzone")]
#[command(author, version, about = "Depth-stratified habitat protection accounting", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Fill the holes of a fine bathymetry raster from a coarse one
    Fill {
        /// Fine-resolution raster with no-data holes
        fine: PathBuf,
        /// Coarse-resolution raster covering the fine one
        coarse: PathBuf,
        /// Output composite raster
        output: PathBuf,
        /// Domain-of-interest polygon layer (JSON)
        #[arg(short, long)]
        domain: Option<PathBuf>,
        /// Offset of the smoothing grid in cells
        #[arg(short, long, default_value = "0.5")]
        shift: f64,
    },
    /// Run the full pipeline from a JSON configuration
    Run {
        /// Run configuration file
        config: PathBuf,
        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a configuration template
    Init {
        /// Output configuration file
        #[arg(default_value = "bathyzone.json")]
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Logging was already initialised");
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} ({})", raster.cols(), raster.rows(), path.display());
    Ok(raster)
}

/// Read a vector layer and bring it into `target`
fn read_projected(path: &Path, target: &CRS) -> Result<FeatureCollection> {
    let pb = spinner("Reading layer...");
    let layer = read_layer(path)
        .with_context(|| format!("Failed to read layer {}", path.display()))?;
    pb.finish_and_clear();
    let layer = if layer.crs.is_some() {
        layer
            .reproject(target)
            .with_context(|| format!("Cannot bring {} into {}", path.display(), target))?
    } else {
        warn!("{} declares no CRS; assuming {}", path.display(), target);
        FeatureCollection {
            crs: Some(target.clone()),
            ..layer
        }
    };
    info!("Layer: {} features ({})", layer.len(), path.display());
    Ok(layer)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn ensure_crs(raster: &Raster<f64>, target: &CRS, path: &Path) -> Result<()> {
    match raster.crs() {
        Some(crs) if !crs.is_equivalent(target) => anyhow::bail!(
            "{} is in {}, expected {}",
            path.display(),
            crs,
            target
        ),
        Some(_) => Ok(()),
        None => {
            warn!("{} declares no CRS; assuming {}", path.display(), target);
            Ok(())
        }
    }
}

// ─── Pipeline ───────────────────────────────────────────────────────────

fn run_pipeline(config: &RunConfig) -> Result<()> {
    let target = CRS::from_epsg(config.target_epsg);
    let schedule = config.schedule()?;
    let (deepest, shallowest) = schedule.band_depths();
    info!("Depth strata: {}", schedule.strata().labels().join(" "));
    info!("Habitat band: {} to {} ({})", shallowest, deepest, schedule.band_labels().join(" "));

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    // Inputs, all brought into one frame before any computation
    let fine = read_raster(&config.fine)?;
    let coarse = read_raster(&config.coarse)?;
    ensure_crs(&fine, &target, &config.fine)?;
    ensure_crs(&coarse, &target, &config.coarse)?;

    let domain = match &config.domain {
        Some(path) => Some(read_projected(path, &target)?.polygons()),
        None => None,
    };

    let region_layer = read_projected(&config.regions.path, &target)?;
    let regions = RegionSet::from_layer(&region_layer, &config.regions.id_field, config.allow_list())
        .context("Failed to build reporting regions")?;
    if let Some(allow) = config.allow_list() {
        let missing = regions.missing_ids(allow);
        if !missing.is_empty() {
            warn!("Allow-listed regions not found in layer: {:?}", missing);
        }
    }
    info!("Reporting regions: {}", regions.len());

    let layers = config
        .vintages
        .iter()
        .map(|v| {
            let layer = read_projected(&v.path, &target)?;
            Ok(ProtectionLayer::from_layer(&v.label, &layer, v.id_field.as_deref()))
        })
        .collect::<Result<Vec<_>>>()?;

    // Composite, computed once and shared by every vintage
    let start = Instant::now();
    let params = GapFillParams {
        smoothing_shift: config.smoothing_shift,
        coarse_margin_cells: config.coarse_margin_cells,
    };
    let filled = fill_gaps(&fine, &coarse, domain.as_ref(), &params)
        .context("Gap filling failed")?;
    let mut composite = filled.raster;
    composite.set_crs(Some(target.clone()));
    info!(
        "Gap fill: {} holes, {} filled, {} residual",
        filled.report.original_gaps, filled.report.filled_cells, filled.report.residual.cells
    );
    let composite_path = config.output_dir.join("composite.tif");
    write_result(&composite, &composite_path)?;

    // Misalignment in any layer aborts the whole run
    for layer in &layers {
        check_alignment(&composite, &regions, layer)
            .with_context(|| format!("Inputs misaligned for layer {}", layer.label()))?;
    }

    let runs = run_vintages(&composite, &regions, &schedule, config.tolerance, &layers);

    let mut failed = Vec::new();
    for (layer, run) in layers.iter().zip(runs) {
        match run {
            Ok(run) => {
                if run.table.audit.unstratified_cells > 0 {
                    warn!(
                        "{}: {} cells outside the depth schedule were not counted",
                        run.label(),
                        run.table.audit.unstratified_cells
                    );
                }
                let files = run
                    .persist(&config.output_dir)
                    .with_context(|| format!("Failed to write results for {}", run.label()))?;
                println!("{} results saved to: {}", run.label(), files.json.display());
            }
            Err(e) => {
                error!("Layer {} rejected: {}", layer.label(), e);
                failed.push(layer.label().to_string());
            }
        }
    }

    done("Composite", &composite_path, start.elapsed());

    if !failed.is_empty() {
        anyhow::bail!("No results persisted for: {}", failed.join(", "));
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        // ── Fill ─────────────────────────────────────────────────────
        Commands::Fill {
            fine,
            coarse,
            output,
            domain,
            shift,
        } => {
            let fine_raster = read_raster(&fine)?;
            let coarse_raster = read_raster(&coarse)?;
            let domain = match domain {
                Some(path) => {
                    let target = fine_raster.crs().cloned().unwrap_or_default();
                    Some(read_projected(&path, &target)?.polygons())
                }
                None => None,
            };

            let start = Instant::now();
            let params = GapFillParams {
                smoothing_shift: shift,
                ..GapFillParams::default()
            };
            let filled = fill_gaps(&fine_raster, &coarse_raster, domain.as_ref(), &params)
                .context("Failed to fill gaps")?;
            let elapsed = start.elapsed();
            println!(
                "  Holes: {}, filled: {}, residual: {}",
                filled.report.original_gaps, filled.report.filled_cells, filled.report.residual.cells
            );
            write_result(&filled.raster, &output)?;
            done("Composite", &output, elapsed);
        }

        // ── Run ──────────────────────────────────────────────────────
        Commands::Run { config, output_dir } => {
            let mut config = RunConfig::load(&config)?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            run_pipeline(&config)?;
        }

        // ── Init ─────────────────────────────────────────────────────
        Commands::Init { output } => {
            let json = serde_json::to_string_pretty(&RunConfig::default())?;
            std::fs::write(&output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Configuration template saved to: {}", output.display());
        }
    }

    Ok(())
}
