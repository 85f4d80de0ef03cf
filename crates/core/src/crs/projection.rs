//! Projection definitions resolved through proj4rs.
//!
//! EPSG codes are looked up in the `crs-definitions` table and parsed as
//! PROJ.4 strings; custom `+proj=...` strings are parsed directly.

use crate::error::{Error, Result};
use proj4rs::proj::Proj;
use std::fmt;

/// PROJ.4 definition of an EPSG code, if the bundled table knows it
pub fn epsg_definition(code: u32) -> Option<&'static str> {
    u16::try_from(code)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

/// Whether a PROJ.4 definition describes longitude/latitude coordinates
pub fn is_longlat(definition: &str) -> bool {
    definition.split_whitespace().any(|token| {
        matches!(
            token,
            "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon"
        )
    })
}

/// Canonical form of a definition: whitespace collapsed, `+type=crs` dropped
pub(crate) fn normalise(definition: &str) -> String {
    definition
        .split_whitespace()
        .filter(|token| *token != "+type=crs")
        .collect::<Vec<_>>()
        .join(" ")
}

/// A parsed projection, ready for point transformation
pub struct Projection {
    proj: Proj,
    definition: String,
    geographic: bool,
}

impl Projection {
    /// Resolve an EPSG code
    ///
    /// # Errors
    /// `UnsupportedCrs` if the code is unknown or its definition cannot be parsed.
    pub fn from_epsg(code: u32) -> Result<Self> {
        let definition = epsg_definition(code)
            .ok_or_else(|| Error::UnsupportedCrs(format!("EPSG:{} is not supported", code)))?;
        Self::from_proj_string(definition)
    }

    /// Parse a PROJ.4 definition string
    pub fn from_proj_string(definition: &str) -> Result<Self> {
        let proj = Proj::from_proj_string(definition).map_err(|e| {
            Error::UnsupportedCrs(format!("invalid projection '{}': {:?}", definition, e))
        })?;
        Ok(Self {
            proj,
            definition: normalise(definition),
            geographic: is_longlat(definition),
        })
    }

    /// Longitude/latitude in degrees rather than projected metres
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub(crate) fn proj(&self) -> &Proj {
        &self.proj
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("definition", &self.definition)
            .field("geographic", &self.geographic)
            .finish_non_exhaustive()
    }
}
