//! I/O operations for reading and writing geospatial data
//!
//! - GeoTIFF (single band) through the `tiff` crate, with transform, CRS
//!   (EPSG from the GeoKeyDirectory) and `GDAL_NODATA` support
//! - GeoJSON feature collections through `serde_json`, CRS84 unless a
//!   `crs` member or [`GeoJsonOptions`] says otherwise

mod geojson;
mod geotiff;

pub use geojson::{
    read_geojson, read_geojson_from_str, read_geojson_from_str_with_options,
    read_geojson_with_options, write_geojson, write_geojson_to_string, GeoJsonOptions,
};
pub use geotiff::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer, GeoTiffOptions,
};
