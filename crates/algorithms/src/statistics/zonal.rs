//! Zonal statistics over polygon features
//!
//! For every feature, the valid raster cells whose centre lies inside the
//! polygon or on its boundary are collected and reduced. Features are
//! independent, so the aggregation runs in parallel over features.

use geo::{BoundingRect, Intersects};
use geo_types::{Coord, Geometry, MultiPolygon, Polygon, Rect};
use standgis_core::raster::Raster;
use standgis_core::vector::{FeatureCollection, FeatureId};
use standgis_core::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

use super::reducer::ZonalReducer;
use crate::maybe_rayon::*;

/// Result of zonal statistics for one feature
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalRecord {
    /// Identifier of the feature the values belong to
    pub id: FeatureId,
    /// Number of valid cells attributed to the feature
    pub cell_count: usize,
    /// One value per reducer, in the order of [`ZonalTable::labels`];
    /// `None` when no cell was attributed
    pub values: Vec<Option<f64>>,
}

/// Zonal statistics of one raster over a feature collection
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalTable {
    /// Reducer labels, one per value column
    pub labels: Vec<String>,
    /// One record per feature
    pub records: Vec<ZonalRecord>,
}

impl ZonalTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column index of a reducer label
    pub fn column(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Id-keyed view for repeated lookups; build it once per table
    pub fn index(&self) -> ZonalIndex<'_> {
        ZonalIndex {
            table: self,
            rows: self.records.iter().enumerate().map(|(i, r)| (&r.id, i)).collect(),
        }
    }
}

/// Records of a [`ZonalTable`] keyed by feature id
#[derive(Debug, Clone)]
pub struct ZonalIndex<'a> {
    table: &'a ZonalTable,
    rows: HashMap<&'a FeatureId, usize>,
}

impl<'a> ZonalIndex<'a> {
    /// Record of a feature
    pub fn record(&self, id: &FeatureId) -> Option<&'a ZonalRecord> {
        self.rows.get(id).map(|&i| &self.table.records[i])
    }

    /// Value of `label` for feature `id`; `None` if either is unknown or
    /// the feature had no cells
    pub fn value(&self, id: &FeatureId, label: &str) -> Option<f64> {
        let col = self.table.column(label)?;
        self.record(id).and_then(|r| r.values.get(col).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Area geometries that can own cells
enum Footprint<'a> {
    Polygon(&'a Polygon<f64>),
    MultiPolygon(&'a MultiPolygon<f64>),
    Rect(&'a Rect<f64>),
}

impl<'a> Footprint<'a> {
    fn from_geometry(geometry: Option<&'a Geometry<f64>>) -> Option<Self> {
        match geometry? {
            Geometry::Polygon(p) => Some(Footprint::Polygon(p)),
            Geometry::MultiPolygon(mp) => Some(Footprint::MultiPolygon(mp)),
            Geometry::Rect(r) => Some(Footprint::Rect(r)),
            _ => None,
        }
    }

    fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            Footprint::Polygon(p) => p.bounding_rect(),
            Footprint::MultiPolygon(mp) => mp.bounding_rect(),
            Footprint::Rect(r) => Some(**r),
        }
    }

    /// Inside or on the boundary
    fn covers(&self, c: Coord<f64>) -> bool {
        match self {
            Footprint::Polygon(p) => p.intersects(&c),
            Footprint::MultiPolygon(mp) => mp.intersects(&c),
            Footprint::Rect(r) => {
                let (min, max) = (r.min(), r.max());
                c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y
            }
        }
    }
}

/// Valid values of every cell whose centre the footprint covers
fn collect_values(raster: &Raster<f64>, footprint: &Footprint<'_>) -> Vec<f64> {
    let Some(bounds) = footprint.bounds() else {
        return Vec::new();
    };

    let (rows, cols) = raster.shape();
    let (min, max) = (bounds.min(), bounds.max());
    let window = raster
        .transform()
        .cell_window((min.x, min.y, max.x, max.y), rows, cols);

    let mut values = Vec::with_capacity(window.len());
    for row in window.row_start..window.row_end {
        for col in window.col_start..window.col_end {
            let v = raster.data()[(row, col)];
            if raster.is_nodata(v) {
                continue;
            }
            let (x, y) = raster.pixel_to_geo(col, row);
            if footprint.covers(Coord { x, y }) {
                values.push(v);
            }
        }
    }
    values
}

/// Compute zonal statistics of `raster` for every feature
///
/// Returns one record per feature, in collection order, each tagged with
/// the identifier read from `id_field`. A feature without cells (outside
/// the raster, smaller than a cell and missing every centre, or not an
/// area geometry) gets `None` for every reducer.
///
/// # Errors
/// - `CrsMismatch` if raster and features both carry CRSs that differ
/// - `MissingFeatureId` / `DuplicateFeatureId` for bad identifiers
pub fn zonal_statistics<R: ZonalReducer>(
    raster: &Raster<f64>,
    features: &FeatureCollection,
    id_field: &str,
    reducers: &[R],
) -> Result<ZonalTable> {
    if let (Some(r), Some(v)) = (raster.crs(), features.crs.as_ref()) {
        if !r.is_equivalent(v) {
            return Err(Error::CrsMismatch(r.to_string(), v.to_string()));
        }
    }

    let ids = features.feature_ids(id_field)?;
    let labels: Vec<String> = reducers.iter().map(|r| r.label()).collect();

    debug!(
        features = features.len(),
        reducers = ?labels,
        "computing zonal statistics"
    );

    let records: Vec<ZonalRecord> = ids
        .into_par_iter()
        .enumerate()
        .map(|(i, id)| {
            let feature = &features.features[i];
            let mut values = Footprint::from_geometry(feature.geometry.as_ref())
                .map(|fp| collect_values(raster, &fp))
                .unwrap_or_default();

            ZonalRecord {
                id,
                cell_count: values.len(),
                values: reducers.iter().map(|r| r.reduce(&mut values)).collect(),
            }
        })
        .collect();

    let empty = records.iter().filter(|r| r.cell_count == 0).count();
    if empty > 0 {
        debug!(empty, "features without attributable cells");
    }

    Ok(ZonalTable { labels, records })
}
