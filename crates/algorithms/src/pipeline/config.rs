//! Pipeline configuration
//!
//! `PipelineConfig` names the input and output files, `PipelineParams`
//! holds everything that changes the numbers. Both deserialize from YAML;
//! omitted parameters take the defaults below.
//!
//! ```yaml
//! stands: data/stands.geojson
//! raster: data/dsm.tif
//! output_dir: out
//! params:
//!   window_size: 15
//!   statistics: [mean, p90]
//! ```

use serde::{Deserialize, Serialize};
use standgis_core::{Error, Result, CRS};
use std::fs;
use std::path::{Path, PathBuf};

use crate::morphology::SquareWindow;
use crate::statistics::ZonalStatistic;

/// Parameters of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineParams {
    /// Side of the square opening window in cells
    pub window_size: usize,
    /// Statistics computed per stand for each raster product
    pub statistics: Vec<ZonalStatistic>,
    /// Attribute holding the stand identifier
    pub id_field: String,
    /// EPSG code of the enriched stands output
    pub output_epsg: u32,
    /// Floor canopy heights at 0
    pub clamp_negative_canopy: bool,
    /// Attribute suffix for statistics of the surface raster
    pub elevation_suffix: String,
    /// Attribute suffix for statistics of the canopy raster
    pub canopy_suffix: String,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            window_size: 15,
            statistics: vec![ZonalStatistic::Mean],
            id_field: "StandID".to_string(),
            output_epsg: 4326,
            clamp_negative_canopy: false,
            elevation_suffix: "elev".to_string(),
            canopy_suffix: "canopy".to_string(),
        }
    }
}

impl PipelineParams {
    /// Window used for the terrain opening
    pub fn window(&self) -> SquareWindow {
        SquareWindow::new(self.window_size)
    }

    /// Target CRS of the enriched stands
    pub fn output_crs(&self) -> CRS {
        CRS::from_epsg(self.output_epsg)
    }

    /// Check everything that does not depend on the input data
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(invalid("window_size", "0", "window size must be at least 1"));
        }
        if self.statistics.is_empty() {
            return Err(invalid("statistics", "[]", "at least one statistic is required"));
        }
        if self.id_field.trim().is_empty() {
            return Err(invalid("id_field", &self.id_field, "identifier field must not be empty"));
        }
        if self.elevation_suffix.is_empty() || self.canopy_suffix.is_empty() {
            return Err(invalid("suffix", "", "attribute suffixes must not be empty"));
        }
        if self.elevation_suffix == self.canopy_suffix {
            return Err(invalid(
                "suffix",
                &self.canopy_suffix,
                "elevation and canopy suffixes must differ",
            ));
        }
        self.output_crs().projection()?;
        Ok(())
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn default_terrain_file() -> String {
    "dtm_approx.tif".to_string()
}

fn default_canopy_file() -> String {
    "chm.tif".to_string()
}

fn default_stands_file() -> String {
    "stands_with_stats.geojson".to_string()
}

/// Files of one pipeline run plus its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stand polygons (GeoJSON)
    pub stands: PathBuf,
    /// Surface model (single-band GeoTIFF)
    pub raster: PathBuf,
    /// Directory receiving every output
    pub output_dir: PathBuf,
    /// Approximated terrain GeoTIFF, relative to `output_dir`
    #[serde(default = "default_terrain_file")]
    pub terrain_file: String,
    /// Canopy height GeoTIFF, relative to `output_dir`
    #[serde(default = "default_canopy_file")]
    pub canopy_file: String,
    /// Enriched stands GeoJSON, relative to `output_dir`
    #[serde(default = "default_stands_file")]
    pub stands_file: String,
    /// CRS assigned to the stands when the GeoJSON declares none (instead of CRS84)
    #[serde(default)]
    pub stands_crs: Option<String>,
    #[serde(default)]
    pub params: PipelineParams,
}

impl PipelineConfig {
    /// Config with default file names and parameters
    pub fn new(
        stands: impl Into<PathBuf>,
        raster: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stands: stands.into(),
            raster: raster.into(),
            output_dir: output_dir.into(),
            terrain_file: default_terrain_file(),
            canopy_file: default_canopy_file(),
            stands_file: default_stands_file(),
            stands_crs: None,
            params: PipelineParams::default(),
        }
    }

    /// Load a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&contents)
            .map_err(|e| Error::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Parse a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn terrain_path(&self) -> PathBuf {
        self.output_dir.join(&self.terrain_file)
    }

    pub fn canopy_path(&self) -> PathBuf {
        self.output_dir.join(&self.canopy_file)
    }

    pub fn stands_path(&self) -> PathBuf {
        self.output_dir.join(&self.stands_file)
    }
}
