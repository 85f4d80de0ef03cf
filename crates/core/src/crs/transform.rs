//! Coordinate transformation between two CRSs

use super::projection::Projection;
use super::CRS;
use crate::error::{Error, Result};

/// A resolved transformation from one CRS to another.
///
/// Equivalent CRSs resolve to the identity and never touch proj4rs.
/// Geographic coordinates are given and returned in degrees.
#[derive(Debug)]
pub struct CoordTransform {
    route: Option<(Projection, Projection)>,
}

impl CoordTransform {
    /// Build a transform from `source` to `target`.
    ///
    /// Fails with `UnsupportedCrs` if either CRS cannot be resolved
    /// (unless the two are equivalent, which needs no projection at all).
    pub fn new(source: &CRS, target: &CRS) -> Result<Self> {
        if source.is_equivalent(target) {
            return Ok(Self::identity());
        }
        let src = source.projection()?;
        let dst = target.projection()?;
        if src.definition() == dst.definition() {
            return Ok(Self::identity());
        }
        Ok(Self {
            route: Some((src, dst)),
        })
    }

    /// Transform that leaves coordinates untouched
    pub fn identity() -> Self {
        Self { route: None }
    }

    /// Whether this transform is a no-op
    pub fn is_identity(&self) -> bool {
        self.route.is_none()
    }

    /// Transform that undoes this one
    pub fn inverse(&self) -> Result<Self> {
        match &self.route {
            None => Ok(Self::identity()),
            Some((src, dst)) => Ok(Self {
                route: Some((
                    Projection::from_proj_string(dst.definition())?,
                    Projection::from_proj_string(src.definition())?,
                )),
            }),
        }
    }

    /// Transform a coordinate pair, failing on projection errors and
    /// non-finite results
    pub fn try_apply(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let Some((src, dst)) = &self.route else {
            return Ok((x, y));
        };

        let mut point = if src.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        proj4rs::transform::transform(src.proj(), dst.proj(), &mut point).map_err(|e| {
            Error::Other(format!("coordinate ({}, {}) cannot be transformed: {:?}", x, y, e))
        })?;

        let (tx, ty) = if dst.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if tx.is_finite() && ty.is_finite() {
            Ok((tx, ty))
        } else {
            Err(Error::Other(format!(
                "coordinate ({}, {}) cannot be transformed",
                x, y
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_for_equivalent() {
        let t = CoordTransform::new(&CRS::from_epsg(3067), &CRS::from_epsg(3067)).unwrap();
        assert!(t.is_identity());
        assert_eq!(t.try_apply(385_000.0, 6_672_000.0).unwrap(), (385_000.0, 6_672_000.0));
    }

    #[test]
    fn identity_for_unsupported_but_equal_wkt() {
        let wkt = "PROJCS[\"custom\"]";
        let t = CoordTransform::new(&CRS::from_wkt(wkt), &CRS::from_wkt(wkt)).unwrap();
        assert!(t.is_identity());
    }

    #[test]
    fn unsupported_crs_errors() {
        let err = CoordTransform::new(&CRS::from_epsg(99_999), &CRS::wgs84()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCrs(_)));
    }

    #[test]
    fn utm_to_tm35fin_and_back() {
        // Zone 35 on WGS84 vs TM35FIN on GRS80 differ only by the ellipsoid
        let fwd = CoordTransform::new(&CRS::from_epsg(32635), &CRS::from_epsg(3067)).unwrap();
        let (x, y) = fwd.try_apply(400_000.0, 6_800_000.0).unwrap();
        assert!((x - 400_000.0).abs() < 1.0);
        assert!((y - 6_800_000.0).abs() < 1.0);

        let (bx, by) = fwd.inverse().unwrap().try_apply(x, y).unwrap();
        assert_relative_eq!(bx, 400_000.0, epsilon = 1e-4);
        assert_relative_eq!(by, 6_800_000.0, epsilon = 1e-4);
    }

    #[test]
    fn wgs84_to_utm_and_back_within_tolerance() {
        let t = CoordTransform::new(&CRS::wgs84(), &CRS::from_epsg(32635)).unwrap();
        let (e, n) = t.try_apply(25.5, 61.2).unwrap();
        // 1.5 degrees west of the zone 35 central meridian
        assert!((e - 419_500.0).abs() < 2_000.0, "easting {}", e);
        let (lon, lat) = t.inverse().unwrap().try_apply(e, n).unwrap();
        assert!((lon - 25.5).abs() < 1e-7);
        assert!((lat - 61.2).abs() < 1e-7);
    }

    #[test]
    fn sweref99_tm_to_wgs84() {
        // Stockholm, SWEREF99 TM
        let t = CoordTransform::new(&CRS::from_epsg(3006), &CRS::wgs84()).unwrap();
        let (lon, lat) = t.try_apply(674_032.0, 6_580_822.0).unwrap();
        assert!((lon - 18.07).abs() < 0.05, "lon {}", lon);
        assert!((lat - 59.33).abs() < 0.05, "lat {}", lat);
    }
}
