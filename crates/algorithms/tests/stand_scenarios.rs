//! End-to-end scenarios on small synthetic stands.
//!
//! Every raster here is tiny and built in code, so expected values can be
//! worked out by hand.

use geo_types::{polygon, Geometry};
use standgis_algorithms::morphology::{opening, SquareWindow};
use standgis_algorithms::pipeline::{Pipeline, PipelineParams};
use standgis_algorithms::statistics::{zonal_statistics, ZonalStatistic};
use standgis_algorithms::terrain::{approximate_terrain, canopy_height, CanopyParams, TerrainParams};
use standgis_algorithms::vector::{join_zonal, reproject_collection};
use standgis_core::vector::{AttributeValue, Feature, FeatureCollection, FeatureId};
use standgis_core::{GeoTransform, Raster, CRS};

use approx::assert_relative_eq;

const ORIGIN_X: f64 = 385_000.0;
const ORIGIN_Y: f64 = 6_672_000.0;

/// 3x3 grid, 10 m cells, EPSG:3067
fn spike() -> Raster<f64> {
    Raster::from_vec(vec![10.0, 10.0, 10.0, 10.0, 50.0, 10.0, 10.0, 10.0, 10.0], 3, 3)
        .unwrap()
        .with_transform(GeoTransform::new(ORIGIN_X, ORIGIN_Y, 10.0, -10.0))
        .with_crs(CRS::from_epsg(3067))
}

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)].into()
}

fn full_extent_stand() -> FeatureCollection {
    let fc: FeatureCollection = vec![Feature::new(square(ORIGIN_X, ORIGIN_Y - 30.0, ORIGIN_X + 30.0, ORIGIN_Y))
        .with_property("StandID", AttributeValue::Int(1))]
    .into_iter()
    .collect();
    fc.with_crs(CRS::from_epsg(3067))
}

/// Deterministic surface: ramp plus xorshift noise, a few no-data holes
fn noisy_surface(rows: usize, cols: usize) -> Raster<f64> {
    let mut state: u64 = 88_172_645_463_325_252;
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            if state % 37 == 0 {
                data.push(-9999.0);
            } else {
                data.push(100.0 + row as f64 * 0.3 + col as f64 * 0.2 + (state % 2000) as f64 / 100.0);
            }
        }
    }
    Raster::from_vec(data, rows, cols)
        .unwrap()
        .with_transform(GeoTransform::new(ORIGIN_X, ORIGIN_Y, 2.0, -2.0))
        .with_crs(CRS::from_epsg(3067))
        .with_nodata(-9999.0)
}

#[test]
fn spike_window_one_is_identity() {
    let out = Pipeline::new(PipelineParams { window_size: 1, ..Default::default() })
        .run(&spike(), full_extent_stand())
        .unwrap();

    assert_eq!(out.terrain.data(), spike().data());
    assert!(out.canopy.data().iter().all(|&v| v == 0.0));

    let f = &out.stands.features[0];
    let elev = f.get_property("mean_elev").and_then(AttributeValue::as_f64).unwrap();
    assert_relative_eq!(elev, 130.0 / 9.0, epsilon = 1e-12);
    assert_eq!(f.get_property("mean_canopy"), Some(&AttributeValue::Float(0.0)));
}

#[test]
fn spike_window_three() {
    let out = Pipeline::new(PipelineParams { window_size: 3, ..Default::default() })
        .run(&spike(), full_extent_stand())
        .unwrap();

    assert!(out.terrain.data().iter().all(|&v| v == 10.0));
    let expected_canopy = [0.0, 0.0, 0.0, 0.0, 40.0, 0.0, 0.0, 0.0, 0.0];
    assert_eq!(out.canopy.data().iter().copied().collect::<Vec<_>>(), expected_canopy);

    let id = FeatureId::new("1");
    assert_relative_eq!(out.canopy_stats.index().value(&id, "mean").unwrap(), 40.0 / 9.0, epsilon = 1e-12);
    assert_eq!(out.elevation_stats.index().record(&id).unwrap().cell_count, 9);

    // Output is geographic
    assert_eq!(out.stands.crs.as_ref().and_then(|c| c.epsg()), Some(4326));
    match &out.stands.features[0].geometry {
        Some(Geometry::Polygon(p)) => {
            let c = p.exterior().0[0];
            assert!((24.0..26.0).contains(&c.x) && (60.0..61.0).contains(&c.y));
        }
        other => panic!("unexpected geometry {:?}", other),
    }
}

#[test]
fn opening_is_anti_extensive_and_idempotent() {
    let surface = noisy_surface(40, 57);
    for size in [2, 5, 15] {
        let window = SquareWindow::new(size);
        let once = opening(&surface, &window).unwrap();
        let twice = opening(&once, &window).unwrap();

        for ((&v, &o), &t) in surface.data().iter().zip(once.data()).zip(twice.data()) {
            if surface.is_nodata(v) {
                assert!(o.is_nan());
                continue;
            }
            assert!(o <= v);
            assert_eq!(o, t);
        }
    }
}

#[test]
fn canopy_non_negative_where_valid() {
    let surface = noisy_surface(30, 30);
    let terrain = approximate_terrain(&surface, &TerrainParams { window_size: 7 }).unwrap();
    let canopy = canopy_height(&surface, &terrain, &CanopyParams::default()).unwrap();

    for (&s, &c) in surface.data().iter().zip(canopy.data()) {
        if surface.is_nodata(s) {
            assert!(c.is_nan());
        } else {
            assert!(c >= 0.0, "negative canopy {}", c);
        }
    }
}

#[test]
fn constant_raster_mean_is_exact() {
    let c = 7.25;
    let raster: Raster<f64> = Raster::filled(50, 50, c)
        .with_transform(GeoTransform::new(ORIGIN_X, ORIGIN_Y, 2.0, -2.0))
        .with_crs(CRS::from_epsg(3067));

    let mut fc = FeatureCollection::new().with_crs(CRS::from_epsg(3067));
    let shapes = [
        square(ORIGIN_X + 3.1, ORIGIN_Y - 40.7, ORIGIN_X + 61.3, ORIGIN_Y - 2.2),
        polygon![
            (x: ORIGIN_X + 10.0, y: ORIGIN_Y - 90.0),
            (x: ORIGIN_X + 95.0, y: ORIGIN_Y - 70.0),
            (x: ORIGIN_X + 40.0, y: ORIGIN_Y - 5.0),
        ]
        .into(),
    ];
    for (i, shape) in shapes.into_iter().enumerate() {
        fc.push(Feature::new(shape).with_property("StandID", AttributeValue::Int(i as i64)));
    }

    let table = zonal_statistics(&raster, &fc, "StandID", &[ZonalStatistic::Mean]).unwrap();
    for rec in &table.records {
        assert!(rec.cell_count > 0);
        assert_eq!(rec.values[0], Some(c));
    }
}

#[test]
fn stand_outside_raster_is_null() {
    let mut fc = full_extent_stand();
    fc.push(
        Feature::new(square(ORIGIN_X + 1_000.0, ORIGIN_Y, ORIGIN_X + 1_050.0, ORIGIN_Y + 50.0))
            .with_property("StandID", AttributeValue::Int(2)),
    );

    let out = Pipeline::new(PipelineParams { window_size: 3, ..Default::default() })
        .run(&spike(), fc)
        .unwrap();

    let outside = &out.stands.features[1];
    assert_eq!(outside.get_property("mean_elev"), Some(&AttributeValue::Null));
    assert_eq!(outside.get_property("mean_canopy"), Some(&AttributeValue::Null));
    assert!(out.stands.features[0].get_property("mean_elev").and_then(AttributeValue::as_f64).is_some());
}

#[test]
fn join_is_invariant_to_record_order() {
    let surface = noisy_surface(20, 20);
    let mut fc = FeatureCollection::new().with_crs(CRS::from_epsg(3067));
    for i in 0..6 {
        let x0 = ORIGIN_X + i as f64 * 6.0;
        fc.push(
            Feature::new(square(x0, ORIGIN_Y - 30.0, x0 + 6.0, ORIGIN_Y))
                .with_property("StandID", AttributeValue::String(format!("S{}", i))),
        );
    }

    let table = zonal_statistics(&surface, &fc, "StandID", &[ZonalStatistic::Mean, ZonalStatistic::Max]).unwrap();
    let mut shuffled = table.clone();
    shuffled.records.rotate_left(4);
    shuffled.records.swap(0, 3);

    let mut a = fc.clone();
    let mut b = fc.clone();
    join_zonal(&mut a, &table, "StandID", "elev").unwrap();
    join_zonal(&mut b, &shuffled, "StandID", "elev").unwrap();

    for (fa, fb) in a.iter().zip(b.iter()) {
        assert_eq!(fa.get_property("mean_elev"), fb.get_property("mean_elev"));
        assert_eq!(fa.get_property("max_elev"), fb.get_property("max_elev"));
    }
}

#[test]
fn reprojection_roundtrip_within_tolerance() {
    let mut fc = full_extent_stand();
    let before = fc.features[0].geometry.clone();

    reproject_collection(&mut fc, &CRS::wgs84()).unwrap();
    let geographic = fc.features[0].geometry.clone();
    reproject_collection(&mut fc, &CRS::from_epsg(32635)).unwrap();
    reproject_collection(&mut fc, &CRS::wgs84()).unwrap();

    let (Some(Geometry::Polygon(g0)), Some(Geometry::Polygon(g1))) = (geographic, fc.features[0].geometry.clone()) else {
        panic!("polygon expected");
    };
    for (a, b) in g0.exterior().0.iter().zip(&g1.exterior().0) {
        assert!((a.x - b.x).abs() < 1e-7 && (a.y - b.y).abs() < 1e-7);
    }

    reproject_collection(&mut fc, &CRS::from_epsg(3067)).unwrap();
    let (Some(Geometry::Polygon(p0)), Some(Geometry::Polygon(p1))) = (before, fc.features[0].geometry.clone()) else {
        panic!("polygon expected");
    };
    for (a, b) in p0.exterior().0.iter().zip(&p1.exterior().0) {
        assert!((a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4);
    }
}
