//! Coordinate Reference System handling

mod projection;
mod transform;

pub use projection::{epsg_definition, is_longlat, Projection};
pub use transform::CoordTransform;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation (primary)
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Parse a CRS identifier.
    ///
    /// Accepts `EPSG:3067`, bare codes, OGC URNs
    /// (`urn:ogc:def:crs:EPSG::3067`, `urn:ogc:def:crs:OGC:1.3:CRS84`),
    /// PROJ strings starting with `+proj` and WKT.
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let upper = text.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }
        if text.starts_with("+proj") {
            return Ok(Self::from_proj(text));
        }
        if text.contains('[') {
            return Ok(Self::from_wkt(text));
        }
        if upper.starts_with("EPSG:") || upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            // The code is always the last colon-separated component
            if let Some(code) = upper.rsplit(':').next().and_then(|c| c.parse::<u32>().ok()) {
                return Ok(Self::from_epsg(code));
            }
        }
        if let Ok(code) = text.parse::<u32>() {
            return Ok(Self::from_epsg(code));
        }

        Err(Error::UnsupportedCrs(format!("cannot parse CRS identifier '{}'", text)))
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Resolve the map projection behind this CRS.
    ///
    /// A PROJ string wins over the EPSG code; WKT alone is not resolvable.
    pub fn projection(&self) -> Result<Projection> {
        if let Some(proj) = &self.proj {
            return Projection::from_proj_string(proj);
        }
        match self.epsg {
            Some(code) => Projection::from_epsg(code),
            None => Err(Error::UnsupportedCrs(format!(
                "{} has no EPSG code or PROJ definition",
                self
            ))),
        }
    }

    /// Normalised PROJ.4 definition, if one is known
    pub fn definition(&self) -> Option<String> {
        self.proj
            .as_deref()
            .or_else(|| self.epsg.and_then(epsg_definition))
            .map(projection::normalise)
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        self.definition().is_some_and(|d| is_longlat(&d))
    }

    /// Whether two CRSs describe the same coordinates: equal EPSG codes,
    /// or identical resolved PROJ definitions
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            if a == b {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (self.definition(), other.definition()) {
            return a == b;
        }
        match (&self.wkt, &other.wkt) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// OGC URN form used in the GeoJSON `crs` member
    pub fn urn(&self) -> Option<String> {
        match self.epsg? {
            4326 => Some("urn:ogc:def:crs:OGC:1.3:CRS84".to_string()),
            code => Some(format!("urn:ogc:def:crs:EPSG::{}", code)),
        }
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            // Return first 50 chars of WKT
            let end = wkt.char_indices().nth(50).map(|(i, _)| i).unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl FromStr for CRS {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CRS::parse(s)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), Some(4326));
        assert_eq!(crs.identifier(), "EPSG:4326");
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(4326);
        let b = CRS::wgs84();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&CRS::from_epsg(3067)));
        assert!(!a.is_equivalent(&CRS::from_wkt("GEOGCS[\"WGS 84\"]")));
        assert!(!CRS::from_epsg(32635).is_equivalent(&CRS::from_epsg(25835)));

        let def = CRS::from_epsg(3006).definition().unwrap();
        assert!(CRS::from_proj(format!("  {}  ", def)).is_equivalent(&CRS::from_epsg(3006)));
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(CRS::parse("EPSG:3067").unwrap().epsg(), Some(3067));
        assert_eq!(CRS::parse("epsg:32635").unwrap().epsg(), Some(32635));
        assert_eq!(CRS::parse("urn:ogc:def:crs:EPSG::3067").unwrap().epsg(), Some(3067));
        assert_eq!(CRS::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap().epsg(), Some(4326));
        assert_eq!(CRS::parse("4258").unwrap().epsg(), Some(4258));
        assert!(CRS::parse("+proj=longlat +datum=WGS84").unwrap().proj().is_some());
        assert!(CRS::parse("not a crs").is_err());
    }

    #[test]
    fn test_urn_roundtrip() {
        let crs = CRS::from_epsg(3067);
        let urn = crs.urn().unwrap();
        assert_eq!(CRS::parse(&urn).unwrap(), crs);
        assert_eq!(CRS::wgs84().urn().unwrap(), "urn:ogc:def:crs:OGC:1.3:CRS84");
    }

    #[test]
    fn test_geographic_detection() {
        assert!(CRS::wgs84().is_geographic());
        assert!(CRS::from_epsg(4258).is_geographic());
        assert!(!CRS::from_epsg(3067).is_geographic());
        assert!(CRS::from_epsg(3006).projection().is_ok());
        assert!(CRS::from_epsg(99_999).projection().is_err());
        assert!(CRS::from_wkt("PROJCS[\"custom\"]").projection().is_err());
    }
}
