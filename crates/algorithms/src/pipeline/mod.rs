//! Forest stand pipeline
//!
//! surface raster + stand polygons
//! -> CRS reconciliation -> terrain approximation -> canopy height
//! -> zonal statistics (surface, canopy) -> join by stand id
//! -> reprojection to the output CRS
//!
//! [`Pipeline::run`] works in memory; [`run_pipeline`] adds file I/O and
//! only finalises outputs once every stage and every write succeeded.

mod config;

pub use config::{PipelineConfig, PipelineParams};

use standgis_core::io::{
    read_geojson_with_options, read_geotiff, write_geojson, write_geotiff, GeoJsonOptions,
};
use standgis_core::raster::Raster;
use standgis_core::vector::FeatureCollection;
use standgis_core::{Error, Result, CRS};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::statistics::{zonal_statistics, ZonalTable};
use crate::terrain::{approximate_terrain, canopy_height, CanopyParams, TerrainParams};
use crate::vector::{join_zonal, reconcile_crs, reproject_collection};

/// Products of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Approximated bare-earth terrain, on the input grid
    pub terrain: Raster<f64>,
    /// Canopy height, on the input grid
    pub canopy: Raster<f64>,
    /// Statistics of the input surface per stand
    pub elevation_stats: ZonalTable,
    /// Statistics of the canopy height per stand
    pub canopy_stats: ZonalTable,
    /// Stands with the joined statistics, in the output CRS
    pub stands: FeatureCollection,
}

/// In-memory pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    params: PipelineParams,
}

impl Pipeline {
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Run every stage on a surface raster and its stands
    ///
    /// # Errors
    /// Any stage failure aborts the run: invalid parameters or window
    /// (`InvalidParameter`, `InvalidWindow`), `MissingCrs` on either input,
    /// bad stand identifiers, unsupported CRSs.
    pub fn run(&self, surface: &Raster<f64>, mut stands: FeatureCollection) -> Result<PipelineOutput> {
        let params = &self.params;
        let start = Instant::now();

        params.validate()?;
        params.window().validate_for(surface.rows(), surface.cols())?;
        if surface.crs().is_none() {
            return Err(Error::MissingCrs { subject: "raster" });
        }
        if stands.crs.is_none() {
            return Err(Error::MissingCrs { subject: "stands" });
        }
        stands.feature_ids(&params.id_field)?;

        reconcile_crs(&mut stands, surface.crs())?;

        let terrain = approximate_terrain(
            surface,
            &TerrainParams {
                window_size: params.window_size,
            },
        )?;
        info!(window = params.window_size, "terrain approximated");

        let canopy = canopy_height(
            surface,
            &terrain,
            &CanopyParams {
                clamp_negative: params.clamp_negative_canopy,
            },
        )?;
        info!("canopy height computed");

        let elevation_stats =
            zonal_statistics(surface, &stands, &params.id_field, &params.statistics)?;
        let canopy_stats = zonal_statistics(&canopy, &stands, &params.id_field, &params.statistics)?;
        info!(stands = stands.len(), "zonal statistics computed");

        join_zonal(&mut stands, &elevation_stats, &params.id_field, &params.elevation_suffix)?;
        join_zonal(&mut stands, &canopy_stats, &params.id_field, &params.canopy_suffix)?;

        reproject_collection(&mut stands, &params.output_crs())?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            output_epsg = params.output_epsg,
            "pipeline finished"
        );

        Ok(PipelineOutput {
            terrain,
            canopy,
            elevation_stats,
            canopy_stats,
            stands,
        })
    }
}

/// Load inputs, run the pipeline and write its three outputs
///
/// Outputs are written next to their final names and renamed only after
/// all writes succeeded; on any error nothing new is left behind.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    info!(raster = %config.raster.display(), stands = %config.stands.display(), "loading inputs");

    let surface: Raster<f64> = read_geotiff(&config.raster)?;
    let options = match &config.stands_crs {
        Some(crs) => GeoJsonOptions {
            default_crs: CRS::parse(crs)?,
        },
        None => GeoJsonOptions::default(),
    };
    let stands = read_geojson_with_options(&config.stands, &options)?;

    let output = Pipeline::new(config.params.clone()).run(&surface, stands)?;
    persist(config, &output)?;
    Ok(output)
}

/// Temporary sibling of an output path
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

fn persist(config: &PipelineConfig, output: &PipelineOutput) -> Result<()> {
    fs::create_dir_all(&config.output_dir)?;

    let targets = [config.terrain_path(), config.canopy_path(), config.stands_path()];
    let staged: Vec<PathBuf> = targets.iter().map(|p| staging_path(p)).collect();

    let written = write_geotiff(&output.terrain, &staged[0], None)
        .and_then(|_| write_geotiff(&output.canopy, &staged[1], None))
        .and_then(|_| write_geojson(&output.stands, &staged[2]));
    if let Err(e) = written {
        let leftovers = discard(&staged);
        if leftovers > 0 {
            warn!(leftovers, "staged outputs left behind after failed write");
        }
        return Err(e);
    }

    for (i, (from, to)) in staged.iter().zip(&targets).enumerate() {
        if let Err(e) = fs::rename(from, to) {
            warn!(path = %to.display(), error = %e, "cannot finalise output, rolling back");
            let leftovers = discard(&targets[..i]) + discard(&staged[i..]);
            if leftovers > 0 {
                warn!(leftovers, "rollback incomplete");
            }
            return Err(e.into());
        }
    }

    for path in &targets {
        info!(path = %path.display(), "written");
    }
    Ok(())
}

/// Remove leftover outputs; returns how many could not be removed
fn discard(paths: &[PathBuf]) -> usize {
    let mut failed = 0;
    for path in paths.iter().filter(|p| p.exists()) {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "cannot remove output during rollback");
            failed += 1;
        }
    }
    failed
}
