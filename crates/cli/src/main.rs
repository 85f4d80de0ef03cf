//! StandGIS CLI - terrain, canopy and stand statistics from a surface model

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use standgis_algorithms::pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
use standgis_algorithms::statistics::{zonal_statistics, ZonalStatistic};
use standgis_algorithms::terrain::{approximate_terrain, canopy_height, CanopyParams, TerrainParams};
use standgis_algorithms::vector::{field_name, join_zonal, reconcile_crs};
use standgis_core::io::{
    read_geojson_with_options, read_geotiff, write_geojson, write_geotiff, GeoJsonOptions, GeoTiffOptions,
};
use standgis_core::vector::FeatureCollection;
use standgis_core::{Raster, CRS};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "standgis")]
#[command(author, version, about = "Terrain, canopy height and forest stand statistics", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full stand pipeline
    Run {
        /// YAML configuration; other flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stand polygons (GeoJSON)
        #[arg(long)]
        stands: Option<PathBuf>,
        /// Surface model (GeoTIFF)
        #[arg(long)]
        raster: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Opening window size in cells
        #[arg(short, long)]
        window: Option<usize>,
        /// Statistic per stand: mean, min, max, sum, count, std, median, pNN (repeatable)
        #[arg(long = "stat", value_parser = parse_stat)]
        stats: Vec<ZonalStatistic>,
        /// Attribute holding the stand identifier
        #[arg(long)]
        id_field: Option<String>,
        /// EPSG code of the enriched stands
        #[arg(long)]
        output_epsg: Option<u32>,
        /// CRS of the stands when the GeoJSON declares none (default CRS84)
        #[arg(long)]
        stands_crs: Option<String>,
        /// Floor negative canopy heights at 0
        #[arg(long)]
        clamp_canopy: bool,
    },
    /// Compute the approximated terrain and canopy height rasters only
    Terrain {
        /// Input surface model
        input: PathBuf,
        /// Output terrain raster
        dtm: PathBuf,
        /// Output canopy height raster
        chm: PathBuf,
        /// Opening window size in cells
        #[arg(short, long, default_value = "15")]
        window: usize,
        /// Floor negative canopy heights at 0
        #[arg(long)]
        clamp_canopy: bool,
    },
    /// Zonal statistics of one raster joined onto stands (in the raster CRS)
    Zonal {
        /// Input raster
        raster: PathBuf,
        /// Stand polygons (GeoJSON)
        stands: PathBuf,
        /// Output GeoJSON
        output: PathBuf,
        /// Attribute suffix, e.g. elev -> mean_elev
        #[arg(short, long, default_value = "elev")]
        suffix: String,
        /// Statistic per stand (repeatable)
        #[arg(long = "stat", value_parser = parse_stat, default_value = "mean")]
        stats: Vec<ZonalStatistic>,
        /// Attribute holding the stand identifier
        #[arg(long, default_value = "StandID")]
        id_field: String,
        /// CRS of the stands when the GeoJSON declares none (default CRS84)
        #[arg(long)]
        stands_crs: Option<String>,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
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

fn parse_stat(s: &str) -> std::result::Result<ZonalStatistic, String> {
    s.parse().map_err(|e: standgis_core::Error| e.to_string())
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_stands(path: &Path, legacy_crs: Option<&str>) -> Result<FeatureCollection> {
    let options = match legacy_crs {
        Some(crs) => GeoJsonOptions {
            default_crs: CRS::parse(crs).context("Invalid --stands-crs")?,
        },
        None => GeoJsonOptions::default(),
    };

    let pb = spinner("Reading stands...");
    let stands = read_geojson_with_options(path, &options)
        .with_context(|| format!("Failed to read stands {}", path.display()))?;
    pb.finish_and_clear();
    info!("Stands: {}", stands.len());
    Ok(stands)
}

fn write_raster(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("{:.2}", v))
}

fn print_summary(output: &PipelineOutput, config: &PipelineConfig) {
    let params = &config.params;
    let mut header = vec![params.id_field.clone()];
    for label in &output.elevation_stats.labels {
        header.push(field_name(label, &params.elevation_suffix));
        header.push(field_name(label, &params.canopy_suffix));
    }
    println!("\n{}", header.join("\t"));

    let (elevation, canopy) = (output.elevation_stats.index(), output.canopy_stats.index());
    for record in &output.elevation_stats.records {
        let mut row = vec![record.id.to_string()];
        for label in &output.elevation_stats.labels {
            row.push(format_value(elevation.value(&record.id, label)));
            row.push(format_value(canopy.value(&record.id, label)));
        }
        println!("{}", row.join("\t"));
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Pipeline ─────────────────────────────────────────────────
        Commands::Run {
            config,
            stands,
            raster,
            output_dir,
            window,
            stats,
            id_field,
            output_epsg,
            stands_crs,
            clamp_canopy,
        } => {
            let mut cfg = match config {
                Some(path) => PipelineConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => match (stands.clone(), raster.clone(), output_dir.clone()) {
                    (Some(s), Some(r), Some(o)) => PipelineConfig::new(s, r, o),
                    _ => bail!("Either --config or all of --stands, --raster and --output-dir are required"),
                },
            };

            if let Some(s) = stands {
                cfg.stands = s;
            }
            if let Some(r) = raster {
                cfg.raster = r;
            }
            if let Some(o) = output_dir {
                cfg.output_dir = o;
            }
            if let Some(w) = window {
                cfg.params.window_size = w;
            }
            if !stats.is_empty() {
                cfg.params.statistics = stats;
            }
            if let Some(f) = id_field {
                cfg.params.id_field = f;
            }
            if let Some(epsg) = output_epsg {
                cfg.params.output_epsg = epsg;
            }
            if stands_crs.is_some() {
                cfg.stands_crs = stands_crs;
            }
            if clamp_canopy {
                cfg.params.clamp_negative_canopy = true;
            }

            let start = Instant::now();
            let pb = spinner("Running stand pipeline...");
            let result = run_pipeline(&cfg);
            pb.finish_and_clear();
            let output = result.context("Pipeline failed")?;
            let elapsed = start.elapsed();

            print_summary(&output, &cfg);
            println!();
            done("Terrain", &cfg.terrain_path(), elapsed);
            println!("Canopy height saved to: {}", cfg.canopy_path().display());
            println!("Stands saved to: {}", cfg.stands_path().display());
        }

        // ── Terrain and canopy ───────────────────────────────────────
        Commands::Terrain {
            input,
            dtm,
            chm,
            window,
            clamp_canopy,
        } => {
            let surface = read_raster(&input)?;
            let start = Instant::now();
            let terrain = approximate_terrain(&surface, &TerrainParams { window_size: window })
                .context("Failed to approximate terrain")?;
            let canopy = canopy_height(
                &surface,
                &terrain,
                &CanopyParams {
                    clamp_negative: clamp_canopy,
                },
            )
            .context("Failed to compute canopy height")?;
            let elapsed = start.elapsed();

            write_raster(&terrain, &dtm)?;
            write_raster(&canopy, &chm)?;
            done("Terrain", &dtm, elapsed);
            println!("Canopy height saved to: {}", chm.display());
        }

        // ── Zonal statistics ─────────────────────────────────────────
        Commands::Zonal {
            raster,
            stands,
            output,
            suffix,
            stats,
            id_field,
            stands_crs,
        } => {
            let values = read_raster(&raster)?;
            let mut features = read_stands(&stands, stands_crs.as_deref())?;
            let start = Instant::now();

            reconcile_crs(&mut features, values.crs()).context("Cannot align stands with raster")?;
            let table = zonal_statistics(&values, &features, &id_field, &stats)
                .context("Failed to compute zonal statistics")?;
            join_zonal(&mut features, &table, &id_field, &suffix)?;
            let elapsed = start.elapsed();

            let empty = table.records.iter().filter(|r| r.cell_count == 0).count();
            if empty > 0 {
                info!("{} of {} stands have no cells", empty, table.len());
            }

            let pb = spinner("Writing output...");
            write_geojson(&features, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            pb.finish_and_clear();
            done("Zonal statistics", &output, elapsed);
        }

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
            match raster.crs() {
                Some(crs) => println!("CRS: {}", crs),
                None => println!("CRS: none"),
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
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
            if raster.is_empty() {
                bail!("Raster has no cells");
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }
    }

    Ok(())
}
