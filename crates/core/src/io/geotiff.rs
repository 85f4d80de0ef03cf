//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for TIFF I/O and handles the GeoTIFF tags that
//! matter for single-band elevation products: pixel scale, tiepoint,
//! model transformation, the GeoKeyDirectory (EPSG code only) and
//! `GDAL_NODATA`.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoKey ids (GeoTIFF 1.1, section 7)
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// GDAL_NODATA, stored as ASCII
const GDAL_NODATA: u16 = 42113;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Write the `GDAL_NODATA` tag when the raster has a no-data value
    pub write_nodata: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self { write_nodata: true }
    }
}

/// Read the first band of a GeoTIFF file into a Raster
///
/// # Example
/// ```ignore
/// let dsm: Raster<f64> = read_geotiff("N61E025_copernicus.tif")?;
/// ```
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<T: RasterElement, S: num_traits::NumCast + Copy>(buf: Vec<S>) -> Vec<T> {
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single band of {} samples, got {}",
            rows * cols,
            data.len()
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));

    if let Some(nodata) = read_nodata(&mut decoder) {
        raster.set_nodata(num_traits::cast(nodata));
    }

    Ok(raster)
}

/// GeoTransform from ModelPixelScale + ModelTiepoint, or ModelTransformation
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    // Row-major 4x4 matrix; the first two rows hold the affine terms
    let t = decoder.get_tag_f64_vec(Tag::ModelTransformationTag).ok()?;
    if t.len() >= 16 {
        return Some(GeoTransform::from_gdal([t[3], t[0], t[1], t[7], t[4], t[5]]));
    }

    None
}

/// EPSG code from ProjectedCSTypeGeoKey or GeographicTypeGeoKey
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if keys.len() < 4 {
        return None;
    }

    let num_keys = keys[3] as usize;
    let mut geographic = None;

    for entry in keys[4..].chunks_exact(4).take(num_keys) {
        let (key_id, location, value) = (entry[0], entry[1], entry[3]);
        // Values stored in other tags are not EPSG codes
        if location != 0 || value == 0 || value == 32767 {
            continue;
        }
        match key_id {
            PROJECTED_CS_TYPE => return Some(CRS::from_epsg(value as u32)),
            GEOGRAPHIC_TYPE => geographic = Some(CRS::from_epsg(value as u32)),
            _ => {}
        }
    }

    geographic
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA)).ok()?;
    text.trim_end_matches('\0').trim().parse::<f64>().ok()
}

/// Write a Raster to a GeoTIFF file
///
/// Writes a single 32-bit float band with transform, GeoKeys and no-data.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, BufWriter::new(file), &options.unwrap_or_default())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>, options: Option<GeoTiffOptions>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), &options.unwrap_or_default())?;
    Ok(buf)
}

fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let mut keys: Vec<[u16; 4]> = Vec::with_capacity(3);
    let epsg = crs.and_then(|c| c.epsg()).and_then(|code| u16::try_from(code).ok());
    let geographic = crs.is_some_and(|c| c.is_geographic());

    let model = if geographic { MODEL_TYPE_GEOGRAPHIC } else { MODEL_TYPE_PROJECTED };
    keys.push([GT_MODEL_TYPE, 0, 1, model]);
    keys.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
    if let Some(code) = epsg {
        let key = if geographic { GEOGRAPHIC_TYPE } else { PROJECTED_CS_TYPE };
        keys.push([key, 0, 1, code]);
    }

    // Header: version 1, revision 1.0, key count
    let mut dir = vec![1, 1, 0, keys.len() as u16];
    dir.extend(keys.iter().flatten());
    dir
}

fn tiff_err(what: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", what, e))
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                // Keep the sentinel so the written GDAL_NODATA still matches
                raster
                    .nodata()
                    .and_then(num_traits::cast)
                    .unwrap_or(f32::NAN)
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let gt = raster.transform();
    if gt.row_rotation == 0.0 && gt.col_rotation == 0.0 {
        let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])
            .map_err(tiff_err("Cannot write scale tag"))?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
            .map_err(tiff_err("Cannot write tiepoint tag"))?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        image
            .encoder()
            .write_tag(Tag::ModelTransformationTag, &matrix[..])
            .map_err(tiff_err("Cannot write transformation tag"))?;
    }

    let geokeys = geokey_directory(raster.crs());
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .map_err(tiff_err("Cannot write geokey tag"))?;

    if options.write_nodata {
        if let Some(nodata) = raster.nodata().and_then(|nd| nd.to_f64()) {
            let text = if nodata.is_nan() { "nan".to_string() } else { nodata.to_string() };
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), text.as_str())
                .map_err(tiff_err("Cannot write nodata tag"))?;
        }
    }

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_dsm() -> Raster<f64> {
        let mut raster: Raster<f64> = Raster::new(20, 30)
            .with_transform(GeoTransform::new(385_000.0, 6_672_000.0, 10.0, -10.0))
            .with_crs(CRS::from_epsg(3067))
            .with_nodata(-9999.0);
        for row in 0..20 {
            for col in 0..30 {
                raster.set(row, col, 100.0 + (row * 30 + col) as f64 * 0.5).unwrap();
            }
        }
        raster.set(3, 4, -9999.0).unwrap();
        raster
    }

    #[test]
    fn test_write_read_roundtrip() {
        let raster = sample_dsm();

        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path(), None).unwrap();

        let loaded: Raster<f64> = read_geotiff(tmp.path()).unwrap();

        assert_eq!(loaded.shape(), raster.shape());
        assert_eq!(loaded.transform(), raster.transform());
        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(3067));
        assert_eq!(loaded.nodata(), Some(-9999.0));
        assert_eq!(loaded.get(10, 10).unwrap(), raster.get(10, 10).unwrap());
        assert!(loaded.is_nodata(loaded.get(3, 4).unwrap()));
    }

    #[test]
    fn test_geographic_crs_and_nan_nodata() {
        let mut raster: Raster<f64> = Raster::filled(4, 4, 12.5)
            .with_transform(GeoTransform::new(25.0, 62.0, 0.25, -0.25))
            .with_crs(CRS::wgs84())
            .with_nodata(f64::NAN);
        raster.set(0, 0, f64::NAN).unwrap();

        let buf = write_geotiff_to_buffer(&raster, None).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(4326));
        assert!(loaded.get(0, 0).unwrap().is_nan());
        assert!(loaded.nodata().is_some_and(|nd| nd.is_nan()));
        assert_eq!(loaded.get(2, 2).unwrap(), 12.5);
    }

    #[test]
    fn test_rotated_transform_roundtrip() {
        let mut gt = GeoTransform::new(1000.0, 2000.0, 2.0, -2.0);
        gt.row_rotation = 0.5;
        gt.col_rotation = 0.25;
        let raster: Raster<f64> = Raster::filled(3, 3, 1.0).with_transform(gt);

        let buf = write_geotiff_to_buffer(&raster, None).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();
        assert_eq!(*loaded.transform(), gt);
        assert!(loaded.crs().is_none());
    }

    #[test]
    fn test_geokey_directory_layout() {
        let dir = geokey_directory(Some(&CRS::from_epsg(3067)));
        assert_eq!(&dir[..4], &[1, 1, 0, 3]);
        assert_eq!(&dir[12..16], &[PROJECTED_CS_TYPE, 0, 1, 3067]);

        let dir = geokey_directory(None);
        assert_eq!(dir[3], 2);
    }
}
