//! Reprojection of feature collections and CRS reconciliation
//!
//! Geometries are moved to the raster CRS before any overlay; the raster
//! itself is never resampled.

use geo::MapCoordsInPlace;
use geo_types::{Coord, Geometry};
use standgis_core::crs::{CoordTransform, CRS};
use standgis_core::vector::FeatureCollection;
use standgis_core::{Error, Result};
use tracing::{debug, info};

fn map_coords<G: MapCoordsInPlace<f64>>(shape: &mut G, transform: &CoordTransform) -> Result<()> {
    shape.try_map_coords_in_place(|c: Coord<f64>| {
        transform.try_apply(c.x, c.y).map(|(x, y)| Coord { x, y })
    })
}

/// Transform every coordinate of a geometry in place
///
/// A `Rect` becomes a `Polygon`, since its edges are not axis-aligned in
/// the target CRS.
pub fn reproject_geometry(geometry: &mut Geometry<f64>, transform: &CoordTransform) -> Result<()> {
    if transform.is_identity() {
        return Ok(());
    }
    match geometry {
        Geometry::Point(g) => map_coords(g, transform),
        Geometry::Line(g) => map_coords(g, transform),
        Geometry::LineString(g) => map_coords(g, transform),
        Geometry::Polygon(g) => map_coords(g, transform),
        Geometry::MultiPoint(g) => map_coords(g, transform),
        Geometry::MultiLineString(g) => map_coords(g, transform),
        Geometry::MultiPolygon(g) => map_coords(g, transform),
        Geometry::Triangle(g) => map_coords(g, transform),
        Geometry::Rect(r) => {
            let mut polygon = r.to_polygon();
            map_coords(&mut polygon, transform)?;
            *geometry = Geometry::Polygon(polygon);
            Ok(())
        }
        Geometry::GeometryCollection(gc) => gc
            .0
            .iter_mut()
            .try_for_each(|g| reproject_geometry(g, transform)),
    }
}

/// Reproject a collection to `target`
///
/// Returns `true` if coordinates changed. Attributes and feature order are
/// kept; on error the collection is left untouched.
///
/// # Errors
/// `MissingCrs` if the collection has no CRS, `UnsupportedCrs` if either
/// side cannot be projected.
pub fn reproject_collection(features: &mut FeatureCollection, target: &CRS) -> Result<bool> {
    let source = features
        .crs
        .as_ref()
        .ok_or(Error::MissingCrs { subject: "stands" })?;

    let transform = CoordTransform::new(source, target)?;
    if transform.is_identity() {
        features.crs = Some(target.clone());
        return Ok(false);
    }

    debug!(from = %source, to = %target, features = features.len(), "reprojecting features");

    let mut moved = Vec::with_capacity(features.len());
    for feature in features.iter() {
        let mut geometry = feature.geometry.clone();
        if let Some(g) = geometry.as_mut() {
            reproject_geometry(g, &transform)?;
        }
        moved.push(geometry);
    }

    for (feature, geometry) in features.iter_mut().zip(moved) {
        feature.geometry = geometry;
    }
    features.crs = Some(target.clone());
    Ok(true)
}

/// Bring the features into the raster CRS
///
/// No-op when the two CRSs are equivalent. Returns whether a reprojection
/// happened.
///
/// # Errors
/// `MissingCrs` if either side has no CRS.
pub fn reconcile_crs(features: &mut FeatureCollection, raster_crs: Option<&CRS>) -> Result<bool> {
    let raster_crs = raster_crs.ok_or(Error::MissingCrs { subject: "raster" })?;
    if features.crs.is_none() {
        return Err(Error::MissingCrs { subject: "stands" });
    }

    let moved = reproject_collection(features, raster_crs)?;
    if moved {
        info!(crs = %raster_crs, "stands reprojected to raster CRS");
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, MultiPolygon, Polygon, Rect};
    use standgis_core::vector::{AttributeValue, Feature};

    fn stands_tm35() -> FeatureCollection {
        let p: Polygon<f64> = polygon![
            (x: 385_000.0, y: 6_672_000.0),
            (x: 385_200.0, y: 6_672_000.0),
            (x: 385_200.0, y: 6_671_800.0),
            (x: 385_000.0, y: 6_671_800.0),
        ];
        let mut fc: FeatureCollection = vec![
            Feature::new(p.into())
                .with_property("StandID", AttributeValue::Int(1))
                .with_property("species", AttributeValue::String("pine".into())),
            Feature::empty().with_property("StandID", AttributeValue::Int(2)),
        ]
        .into_iter()
        .collect();
        fc.crs = Some(CRS::from_epsg(3067));
        fc
    }

    fn coords(fc: &FeatureCollection) -> Vec<Coord<f64>> {
        match &fc.features[0].geometry {
            Some(Geometry::Polygon(p)) => p.exterior().0.clone(),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_roundtrip_through_wgs84() {
        let mut fc = stands_tm35();
        let original = coords(&fc);

        assert!(reproject_collection(&mut fc, &CRS::wgs84()).unwrap());
        let geographic = coords(&fc);
        // Helsinki area
        assert!(geographic.iter().all(|c| (24.0..26.0).contains(&c.x) && (60.0..61.0).contains(&c.y)));

        assert!(reproject_collection(&mut fc, &CRS::from_epsg(3067)).unwrap());
        for (a, b) in original.iter().zip(coords(&fc)) {
            assert!((a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4);
        }

        assert_eq!(fc.features[0].get_property("species"), Some(&AttributeValue::String("pine".into())));
        assert!(fc.features[1].geometry.is_none());
        assert_eq!(fc.crs.as_ref().and_then(|c| c.epsg()), Some(3067));
    }

    #[test]
    fn test_reconcile_noop_when_equivalent() {
        let mut fc = stands_tm35();
        let before = coords(&fc);
        assert!(!reconcile_crs(&mut fc, Some(&CRS::from_epsg(3067))).unwrap());
        assert_eq!(coords(&fc), before);
    }

    #[test]
    fn test_reconcile_reprojects_to_raster() {
        let mut fc = stands_tm35();
        assert!(reconcile_crs(&mut fc, Some(&CRS::from_epsg(32635))).unwrap());
        assert_eq!(fc.crs.as_ref().and_then(|c| c.epsg()), Some(32635));
    }

    #[test]
    fn test_missing_crs() {
        let mut fc = stands_tm35();
        assert!(matches!(
            reconcile_crs(&mut fc, None),
            Err(Error::MissingCrs { subject: "raster" })
        ));

        fc.crs = None;
        assert!(matches!(
            reconcile_crs(&mut fc, Some(&CRS::from_epsg(3067))),
            Err(Error::MissingCrs { subject: "stands" })
        ));
    }

    #[test]
    fn test_unsupported_target_leaves_collection() {
        let mut fc = stands_tm35();
        let before = coords(&fc);
        assert!(reproject_collection(&mut fc, &CRS::from_epsg(99_999)).is_err());
        assert_eq!(coords(&fc), before);
        assert_eq!(fc.crs.as_ref().and_then(|c| c.epsg()), Some(3067));
    }

    #[test]
    fn test_multipolygon_reprojected() {
        let parts = MultiPolygon(vec![
            polygon![
                (x: 385_000.0, y: 6_672_000.0),
                (x: 385_100.0, y: 6_672_000.0),
                (x: 385_100.0, y: 6_671_900.0),
            ],
            polygon![
                (x: 386_000.0, y: 6_673_000.0),
                (x: 386_100.0, y: 6_673_000.0),
                (x: 386_100.0, y: 6_672_900.0),
            ],
        ]);
        let mut geometry = Geometry::MultiPolygon(parts.clone());
        let to_wgs84 = CoordTransform::new(&CRS::from_epsg(3067), &CRS::wgs84()).unwrap();
        reproject_geometry(&mut geometry, &to_wgs84).unwrap();

        let Geometry::MultiPolygon(moved) = &geometry else {
            panic!("geometry kind changed: {:?}", geometry);
        };
        assert_eq!(moved.0.len(), 2);
        for p in &moved.0 {
            assert!(p.exterior().0.iter().all(|c| (24.0..26.0).contains(&c.x) && (60.0..61.0).contains(&c.y)));
        }

        reproject_geometry(&mut geometry, &to_wgs84.inverse().unwrap()).unwrap();
        let Geometry::MultiPolygon(back) = &geometry else {
            panic!("geometry kind changed: {:?}", geometry);
        };
        for (a, b) in parts.0.iter().zip(&back.0) {
            for (ca, cb) in a.exterior().0.iter().zip(&b.exterior().0) {
                assert!((ca.x - cb.x).abs() < 1e-4 && (ca.y - cb.y).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_rect_becomes_polygon() {
        let mut geometry = Geometry::Rect(Rect::new(
            Coord { x: 385_000.0, y: 6_671_800.0 },
            Coord { x: 385_200.0, y: 6_672_000.0 },
        ));
        let to_wgs84 = CoordTransform::new(&CRS::from_epsg(3067), &CRS::wgs84()).unwrap();
        reproject_geometry(&mut geometry, &to_wgs84).unwrap();
        assert!(matches!(geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn test_sweref99_stands_to_wgs84() {
        let p: Polygon<f64> = polygon![
            (x: 674_000.0, y: 6_580_800.0),
            (x: 674_100.0, y: 6_580_800.0),
            (x: 674_100.0, y: 6_580_900.0),
        ];
        let mut fc: FeatureCollection = vec![Feature::new(p.into())].into_iter().collect();
        fc.crs = Some(CRS::from_epsg(3006));

        assert!(reproject_collection(&mut fc, &CRS::wgs84()).unwrap());
        assert!(coords(&fc).iter().all(|c| (17.5..18.5).contains(&c.x) && (59.0..60.0).contains(&c.y)));
    }
}
