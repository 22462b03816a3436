//! Unit tests for catchment preparation, policy checks and configuration

use approx::assert_relative_eq;
use basin_grid::{
    catalog::{DatasetCatalog, DatasetInfo},
    catchment::{
        load_catchment, prepare_catchment, validate_preloaded, Catchment, CatchmentSource,
        Provenance,
    },
    config::{CatchmentPolicy, Settings, SubsetOptions},
    crs::Crs,
    errors::{BasinGridError, Result},
    geometry::{
        buffer_geometry, classify, parse_geojson, Bounds, FeatureCollection, Geometry,
        GeometryClass, DEFAULT_QUADRANT_SEGMENTS,
    },
    parallel::ParallelConfig,
    temporal::TimeRange,
    validation::{
        catchment_area_km2, check_aoi_overlap, check_catchment_size, check_feature_count,
        validate, PolicyCheck,
    },
};
use geo::{polygon, Area, CoordsIter, LineString, MultiLineString, MultiPolygon, Point};
use std::f64::consts::PI;
use std::fs;
use tempfile::tempdir;

fn square(min_x: f64, min_y: f64, size: f64) -> Geometry {
    Geometry::Polygon(polygon![
        (x: min_x, y: min_y),
        (x: min_x + size, y: min_y),
        (x: min_x + size, y: min_y + size),
        (x: min_x, y: min_y + size),
    ])
}

#[test]
fn test_error_types() {
    let err = BasinGridError::ValidationError {
        check: "catchment_size".to_string(),
        measured: 0.005,
        message: "too small".to_string(),
    };
    let text = err.to_string();
    assert!(text.contains("catchment_size"));
    assert!(text.contains("0.005"));

    let err = BasinGridError::DatasetNotFound {
        category: "climate".to_string(),
        subcategory: "snow".to_string(),
    };
    assert_eq!(err.to_string(), "Dataset not found: climate/snow");

    let err = BasinGridError::invalid_axis("lat", "axis is empty");
    assert!(err.to_string().contains("Invalid axis 'lat'"));
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.unwrap() > 0);
    assert!(default_config.current_threads() > 0);
}

#[test]
fn test_crs_parsing() {
    assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::WGS84);
    assert_eq!("epsg:3035".parse::<Crs>().unwrap(), Crs::ETRS89_LAEA);
    assert_eq!(
        "urn:ogc:def:crs:EPSG::4326".parse::<Crs>().unwrap(),
        Crs::WGS84
    );
    assert_eq!("3857".parse::<Crs>().unwrap(), Crs::WEB_MERCATOR);
    assert!(matches!(
        "not-a-crs".parse::<Crs>(),
        Err(BasinGridError::CrsError(_))
    ));
    assert!(Crs::WGS84.is_geographic());
    assert!(!Crs::ETRS89_LAEA.is_geographic());
}

#[test]
fn test_classification_priority() {
    let point = Geometry::Point(Point::new(10.0, 50.0));
    let line = Geometry::Line(LineString::from(vec![(10.0, 50.0), (10.1, 50.1)]));
    let poly = square(10.0, 50.0, 0.1);
    let other = Geometry::Unsupported("GeometryCollection".to_string());

    assert_eq!(classify(&[point.clone(), line.clone(), poly]), GeometryClass::Polygon);
    assert_eq!(classify(&[point.clone(), line]), GeometryClass::Line);
    assert_eq!(classify(&[point, other.clone()]), GeometryClass::Point);
    assert_eq!(classify(&[other]), GeometryClass::Unknown);
    assert_eq!(classify(&[]), GeometryClass::Unknown);
}

#[test]
fn test_buffered_point_area() -> Result<()> {
    let d = 1000.0;
    let buffered = buffer_geometry(&Geometry::Point(Point::new(4_321_000.0, 3_210_000.0)), d, 16)?;
    let area = buffered.to_multi_polygon().unwrap().unsigned_area();
    assert_relative_eq!(area, PI * d * d, max_relative = 0.02);

    // Same property through the geographic round trip of a point catchment
    let collection = FeatureCollection::new(
        vec![Geometry::Point(Point::new(10.0, 50.0))],
        Some(Crs::WGS84),
    );
    let policy = CatchmentPolicy::default().with_validation(false, false);
    let prepared = prepare_catchment(&CatchmentSource::Collection(collection), None, &policy)?;
    assert_eq!(prepared.class, GeometryClass::Point);
    let area_km2 = catchment_area_km2(&prepared.collection, Crs::ETRS89_LAEA)?;
    assert_relative_eq!(area_km2, PI, max_relative = 0.02);
    Ok(())
}

#[test]
fn test_buffered_line_area() -> Result<()> {
    let (x0, y0) = (4_321_000.0, 3_210_000.0);
    let (length, d) = (5000.0, 1000.0);

    let segment = LineString::from(vec![(x0, y0), (x0 + length, y0)]);
    let buffered = buffer_geometry(&Geometry::Line(segment), d, DEFAULT_QUADRANT_SEGMENTS)?;
    assert!(matches!(buffered, Geometry::Polygon(_)));
    let area = buffered.to_multi_polygon().unwrap().unsigned_area();
    assert_relative_eq!(area, 2.0 * d * length + PI * d * d, max_relative = 0.02);

    // Collinear segments merge into the same stadium
    let polyline = LineString::from(vec![(x0, y0), (x0 + 2000.0, y0), (x0 + length, y0)]);
    let buffered = buffer_geometry(&Geometry::Line(polyline), d, DEFAULT_QUADRANT_SEGMENTS)?;
    let merged = buffered.to_multi_polygon().unwrap();
    assert_eq!(merged.0.len(), 1);
    assert_relative_eq!(
        merged.unsigned_area(),
        2.0 * d * length + PI * d * d,
        max_relative = 0.02
    );
    Ok(())
}

#[test]
fn test_buffered_crossing_lines_form_one_polygon() -> Result<()> {
    let (x0, y0) = (4_321_000.0, 3_210_000.0);
    let (half, d) = (3000.0, 500.0);
    let cross = MultiLineString::new(vec![
        LineString::from(vec![(x0 - half, y0), (x0 + half, y0)]),
        LineString::from(vec![(x0, y0 - half), (x0, y0 + half)]),
    ]);

    let buffered = buffer_geometry(&Geometry::MultiLine(cross), d, DEFAULT_QUADRANT_SEGMENTS)?;
    let Geometry::Polygon(outline) = &buffered else {
        panic!("expected a single polygon, got {}", buffered.type_name());
    };
    assert!(outline.interiors().is_empty());

    // Two stadiums sharing the square where they cross
    let stadium = 2.0 * d * (2.0 * half) + PI * d * d;
    let expected = 2.0 * stadium - (2.0 * d) * (2.0 * d);
    assert_relative_eq!(outline.unsigned_area(), expected, max_relative = 0.02);
    Ok(())
}

#[test]
fn test_points_rejected_without_buffering() {
    let collection = FeatureCollection::new(
        vec![Geometry::Point(Point::new(10.0, 50.0))],
        Some(Crs::WGS84),
    );
    let policy = CatchmentPolicy::default().with_buffer_points_lines(false);
    let err = load_catchment(&CatchmentSource::Collection(collection), None, &policy);
    assert!(matches!(err, Err(BasinGridError::GeometryError(_))));
}

#[test]
fn test_unknown_and_empty_geometry_rejected() {
    let unknown = FeatureCollection::new(
        vec![Geometry::Unsupported("GeometryCollection".to_string())],
        Some(Crs::WGS84),
    );
    let policy = CatchmentPolicy::default();
    assert!(matches!(
        load_catchment(&CatchmentSource::Collection(unknown), None, &policy),
        Err(BasinGridError::GeometryError(_))
    ));

    let empty = FeatureCollection::new(Vec::new(), Some(Crs::WGS84));
    assert!(matches!(
        load_catchment(&CatchmentSource::Collection(empty), None, &policy),
        Err(BasinGridError::GeometryError(_))
    ));
}

#[test]
fn test_reprojection_round_trip() -> Result<()> {
    let original = validate_preloaded(&FeatureCollection::new(
        vec![square(9.75, 49.75, 0.5)],
        Some(Crs::WGS84),
    ))?;
    let there = original.reproject(Crs::ETRS89_LAEA)?;
    assert_eq!(there.crs(), Crs::ETRS89_LAEA);
    let back = there.reproject(Crs::WGS84)?;

    for (a, b) in original
        .geometry()
        .coords_iter()
        .zip(back.geometry().coords_iter())
    {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-6);
    }
    assert_eq!(back.provenance(), &Provenance::InMemory);
    Ok(())
}

#[test]
fn test_merging_features() -> Result<()> {
    let collection = FeatureCollection::new(
        vec![square(10.0, 50.0, 0.2), square(10.1, 50.0, 0.2)],
        Some(Crs::WGS84),
    );
    let policy = CatchmentPolicy::default();
    let prepared = prepare_catchment(&CatchmentSource::Collection(collection), None, &policy)?;
    let merged = prepared.merged.clone().expect("merged geometry");
    assert_eq!(merged.0.len(), 1);
    assert_relative_eq!(merged.unsigned_area(), 0.3 * 0.2, epsilon = 1e-6);

    let catchment = prepared.into_catchment()?;
    let bounds = catchment.bounds()?;
    assert_relative_eq!(bounds.min_x(), 10.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.max_x(), 10.3, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_feature_count_check() {
    let collection = FeatureCollection::new(
        vec![square(10.0, 50.0, 0.1), square(11.0, 50.0, 0.1), square(12.0, 50.0, 0.1)],
        Some(Crs::WGS84),
    );
    let ok = check_feature_count(&collection, 3);
    assert!(ok.passed);
    assert_eq!(ok.measured, 3.0);

    let too_many = check_feature_count(&collection, 2);
    assert!(!too_many.passed);
    assert!(too_many.message.contains("Maximum allowed: 2"));
}

#[test]
fn test_aoi_overlap_inside_and_outside() -> Result<()> {
    let aoi = Bounds::europe();

    let inside = FeatureCollection::new(vec![square(10.0, 50.0, 1.0)], Some(Crs::WGS84));
    let result = check_aoi_overlap(&inside, &aoi, Crs::WGS84, 0.1)?;
    assert!(result.passed);
    assert_relative_eq!(result.measured, 1.0, epsilon = 1e-9);

    let outside = FeatureCollection::new(vec![square(100.0, 0.0, 1.0)], Some(Crs::WGS84));
    let (passed, measured, _) = check_aoi_overlap(&outside, &aoi, Crs::WGS84, 0.1)?.as_tuple();
    assert!(!passed);
    assert_eq!(measured, 0.0);

    let no_crs = FeatureCollection::new(vec![square(10.0, 50.0, 1.0)], None);
    let result = check_aoi_overlap(&no_crs, &aoi, Crs::WGS84, 0.1)?;
    assert!(!result.passed);
    assert_eq!(result.message, "Catchment has no CRS defined");
    Ok(())
}

#[test]
fn test_aoi_partial_overlap_below_threshold() -> Result<()> {
    // only the westernmost degree of this 20° box lies inside the AOI
    let collection = FeatureCollection::new(
        vec![Geometry::Polygon(polygon![
            (x: 69.0, y: 50.0),
            (x: 89.0, y: 50.0),
            (x: 89.0, y: 51.0),
            (x: 69.0, y: 51.0),
        ])],
        Some(Crs::WGS84),
    );
    let result = check_aoi_overlap(&collection, &Bounds::europe(), Crs::WGS84, 0.1)?;
    assert!(!result.passed);
    assert_relative_eq!(result.measured, 0.05, epsilon = 1e-9);
    assert!(result.message.contains("5.0%"));
    Ok(())
}

#[test]
fn test_size_check_boundary() -> Result<()> {
    // 100 m x 100 m = 0.01 km² in the equal-area CRS
    let exact = FeatureCollection::new(
        vec![Geometry::Polygon(polygon![
            (x: 4_321_000.0, y: 3_210_000.0),
            (x: 4_321_100.0, y: 3_210_000.0),
            (x: 4_321_100.0, y: 3_210_100.0),
            (x: 4_321_000.0, y: 3_210_100.0),
        ])],
        Some(Crs::ETRS89_LAEA),
    );
    let result = check_catchment_size(&exact, Crs::ETRS89_LAEA, 0.01, 500_000.0)?;
    assert!(result.passed, "{}", result.message);
    assert_eq!(result.check, PolicyCheck::CatchmentSize);

    let smaller = FeatureCollection::new(
        vec![Geometry::Polygon(polygon![
            (x: 4_321_000.0, y: 3_210_000.0),
            (x: 4_321_099.0, y: 3_210_000.0),
            (x: 4_321_099.0, y: 3_210_100.0),
            (x: 4_321_000.0, y: 3_210_100.0),
        ])],
        Some(Crs::ETRS89_LAEA),
    );
    let result = check_catchment_size(&smaller, Crs::ETRS89_LAEA, 0.01, 500_000.0)?;
    assert!(!result.passed);
    assert!(result.message.contains("below minimum (0.01 km²)"));
    assert_relative_eq!(result.measured, 0.0099, epsilon = 1e-12);

    let huge = check_catchment_size(&exact, Crs::ETRS89_LAEA, 0.0, 0.001)?;
    assert!(!huge.passed);
    assert!(huge.message.contains("exceeds maximum"));
    Ok(())
}

#[test]
fn test_validation_failure_is_fatal_with_context() {
    let source = CatchmentSource::Extent {
        extent: vec![100.0, 0.0, 101.0, 1.0],
        crs: Crs::WGS84,
    };
    let policy = CatchmentPolicy::default();

    let prepared = prepare_catchment(&source, None, &policy).unwrap();
    assert_eq!(prepared.report.entries().len(), 3);
    assert!(!prepared.report.is_valid());
    assert_eq!(
        prepared.report.first_failure().map(|c| c.check),
        Some(PolicyCheck::AoiOverlap)
    );

    match load_catchment(&source, None, &policy) {
        Err(BasinGridError::ValidationError {
            check, measured, ..
        }) => {
            assert_eq!(check, "aoi_overlap");
            assert_eq!(measured, 0.0);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let relaxed = policy.with_validation(false, true);
    assert!(load_catchment(&source, None, &relaxed).is_ok());
}

#[test]
fn test_extent_catchment() -> Result<()> {
    let source = CatchmentSource::Extent {
        extent: vec![9.75, 49.75, 10.25, 50.25],
        crs: Crs::WGS84,
    };
    let catchment = load_catchment(&source, None, &CatchmentPolicy::default())?;
    assert_eq!(catchment.crs(), Crs::WGS84);
    assert_relative_eq!(catchment.area(), 0.25, epsilon = 1e-12);
    assert_eq!(
        catchment.provenance(),
        &Provenance::Extent {
            extent: [9.75, 49.75, 10.25, 50.25],
            crs: Crs::WGS84
        }
    );

    let projected = load_catchment(&source, Some(Crs::ETRS89_LAEA), &CatchmentPolicy::default())?;
    assert_eq!(projected.crs(), Crs::ETRS89_LAEA);

    let inverted = CatchmentSource::Extent {
        extent: vec![10.25, 49.75, 9.75, 50.25],
        crs: Crs::WGS84,
    };
    assert!(matches!(
        load_catchment(&inverted, None, &CatchmentPolicy::default()),
        Err(BasinGridError::InvalidBounds { .. })
    ));
    Ok(())
}

#[test]
fn test_geojson_catchment_file() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("catchment.geojson");
    fs::write(
        &path,
        r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "a"},
                 "geometry": {"type": "Polygon", "coordinates": [[[10.0, 50.0], [10.5, 50.0], [10.5, 50.5], [10.0, 50.5], [10.0, 50.0]]]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#,
    )?;

    let catchment = load_catchment(
        &CatchmentSource::File(path.clone()),
        None,
        &CatchmentPolicy::default(),
    )?;
    assert_eq!(catchment.crs(), Crs::WGS84);
    assert_eq!(catchment.provenance(), &Provenance::File { path });

    let missing = CatchmentSource::File(dir.path().join("missing.geojson"));
    assert!(matches!(
        load_catchment(&missing, None, &CatchmentPolicy::default()),
        Err(BasinGridError::IoError(_))
    ));
    Ok(())
}

#[test]
fn test_geojson_legacy_crs_and_unsupported_types() -> Result<()> {
    let collection = parse_geojson(
        r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3035"}},
            "features": [
                {"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": []}}
            ]
        }"#,
    )?;
    assert_eq!(collection.crs(), Some(Crs::ETRS89_LAEA));
    assert_eq!(collection.classify(), GeometryClass::Unknown);
    Ok(())
}

#[test]
fn test_geojson_single_feature_and_bare_geometry() -> Result<()> {
    let feature = parse_geojson(
        r#"{
            "type": "Feature",
            "crs": {"type": "name", "properties": {"name": "EPSG:3035"}},
            "properties": {"name": "gauge"},
            "geometry": {"type": "LineString", "coordinates": [[4321000.0, 3210000.0], [4326000.0, 3210000.0]]}
        }"#,
    )?;
    assert_eq!(feature.crs(), Some(Crs::ETRS89_LAEA));
    assert_eq!(feature.len(), 1);
    assert_eq!(feature.classify(), GeometryClass::Line);

    let bare = parse_geojson(r#"{"type": "MultiPoint", "coordinates": [[10.0, 50.0], [10.5, 50.5]]}"#)?;
    assert_eq!(bare.crs(), Some(Crs::WGS84));
    assert!(matches!(bare.features(), [Geometry::MultiPoint(mp)] if mp.0.len() == 2));
    Ok(())
}

#[test]
fn test_geojson_malformed_documents_are_errors() {
    let short_position = r#"{"type": "Point", "coordinates": [10.0]}"#;
    assert!(parse_geojson(short_position).is_err());

    let nested_short_position = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[10.0, 50.0], [10.5], [10.5, 50.5], [10.0, 50.0]]]}}
        ]
    }"#;
    assert!(parse_geojson(nested_short_position).is_err());

    assert!(parse_geojson(r#"{"type": "Circle", "coordinates": [10.0, 50.0]}"#).is_err());
    assert!(parse_geojson("not json").is_err());
}

#[test]
fn test_validation_without_crs_reports_every_check() -> Result<()> {
    let collection = FeatureCollection::new(vec![square(10.0, 50.0, 0.2)], None);
    let policy = CatchmentPolicy::default();

    let report = validate(&collection, &policy)?;
    let checks: Vec<PolicyCheck> = report.entries().iter().map(|e| e.check).collect();
    assert_eq!(
        checks,
        vec![
            PolicyCheck::FeatureCount,
            PolicyCheck::AoiOverlap,
            PolicyCheck::CatchmentSize
        ]
    );
    assert!(report.entries()[0].passed);
    for entry in &report.entries()[1..] {
        assert_eq!(entry.as_tuple(), (false, 0.0, "Catchment has no CRS defined"));
    }

    let size_only = check_catchment_size(&collection, Crs::ETRS89_LAEA, 0.01, 500_000.0)?;
    assert!(!size_only.passed);

    let prepared = prepare_catchment(&CatchmentSource::Collection(collection), None, &policy)?;
    assert_eq!(prepared.report.entries().len(), 3);
    assert!(!prepared.report.is_valid());
    assert!(matches!(
        prepared.into_catchment(),
        Err(BasinGridError::ValidationError { ref check, .. }) if check == "aoi_overlap"
    ));
    Ok(())
}

#[test]
fn test_unmerged_overlapping_features_are_unioned() -> Result<()> {
    let collection = FeatureCollection::new(
        vec![square(10.0, 50.0, 0.2), square(10.1, 50.0, 0.2)],
        Some(Crs::WGS84),
    );
    let policy = CatchmentPolicy {
        merge_features: false,
        ..CatchmentPolicy::default()
    };

    let prepared = prepare_catchment(&CatchmentSource::Collection(collection), None, &policy)?;
    assert!(prepared.merged.is_none());
    let catchment = prepared.into_catchment()?;
    assert_relative_eq!(catchment.area(), 0.3 * 0.2, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_validate_preloaded() -> Result<()> {
    let collection = FeatureCollection::new(
        vec![square(10.0, 50.0, 0.2), square(10.2, 50.0, 0.2)],
        Some(Crs::WGS84),
    );
    let catchment = validate_preloaded(&collection)?;
    assert_relative_eq!(catchment.area(), 0.08, epsilon = 1e-6);

    let no_crs = FeatureCollection::new(vec![square(10.0, 50.0, 0.2)], None);
    assert!(matches!(
        validate_preloaded(&no_crs),
        Err(BasinGridError::CrsError(_))
    ));

    let degenerate = MultiPolygon::new(vec![polygon![
        (x: 10.0, y: 50.0),
        (x: 10.0, y: 50.0),
        (x: 10.0, y: 50.0),
    ]]);
    assert!(Catchment::new(degenerate, Crs::WGS84, Provenance::InMemory).is_err());
    Ok(())
}

#[test]
fn test_settings_from_yaml_and_json() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");

    let yaml = dir.path().join("settings.yaml");
    fs::write(
        &yaml,
        "policy:\n  buffer_distance_m: 500\n  aoi: [0.0, 40.0, 20.0, 60.0]\n  min_area_km2: 1.0\nsubset:\n  buffer_cells: 2\n  clip_to_boundary: true\nthreads: 4\n",
    )?;
    let settings = Settings::from_file(&yaml)?;
    assert_eq!(settings.policy.buffer_distance_m, 500.0);
    assert_eq!(settings.policy.aoi, Bounds::new(0.0, 40.0, 20.0, 60.0)?);
    assert_eq!(settings.policy.min_area_km2, 1.0);
    assert_eq!(settings.policy.max_area_km2, 500_000.0);
    assert_eq!(settings.policy.area_crs, Crs::ETRS89_LAEA);
    assert_eq!(
        settings.subset,
        SubsetOptions::default().with_buffer_cells(2).with_clip(true)
    );
    assert_eq!(settings.threads, Some(4));

    let json = dir.path().join("settings.json");
    fs::write(
        &json,
        r#"{"policy": {"max_features": 5, "area_crs": "EPSG:3857"}}"#,
    )?;
    let settings = Settings::from_file(&json)?;
    assert_eq!(settings.policy.max_features, 5);
    assert_eq!(settings.policy.area_crs, Crs::WEB_MERCATOR);
    assert_eq!(settings.subset, SubsetOptions::default());
    assert!(settings.threads.is_none());

    let bad = dir.path().join("settings.yaml");
    fs::write(&bad, "policy:\n  min_overlap_fraction: 1.5\n")?;
    assert!(matches!(
        Settings::from_file(&bad),
        Err(BasinGridError::ConfigError(_))
    ));

    let inverted = dir.path().join("inverted.yaml");
    fs::write(&inverted, "policy:\n  aoi: [10.0, 40.0, 0.0, 60.0]\n")?;
    assert!(Settings::from_file(&inverted).is_err());

    let toml = dir.path().join("settings.toml");
    fs::write(&toml, "threads = 2\n")?;
    assert!(matches!(
        Settings::from_file(&toml),
        Err(BasinGridError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn test_policy_validation() {
    assert!(CatchmentPolicy::default().validate().is_ok());
    assert!(CatchmentPolicy::default().with_area_range(10.0, 1.0).validate().is_err());
    assert!(CatchmentPolicy::default().with_buffer_distance(0.0).validate().is_err());
    assert!(CatchmentPolicy::default().with_max_features(0).validate().is_err());
    assert!(CatchmentPolicy::default()
        .with_min_overlap_fraction(-0.1)
        .validate()
        .is_err());

    let settings = Settings {
        threads: Some(0),
        ..Settings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn test_catalog_lookup() -> Result<()> {
    let catalog = DatasetCatalog::from_yaml_str(
        r#"
climate:
  temperature:
    path: climate/tas.nc
    crs: EPSG:4326
    temporal: true
    description: Daily mean temperature
  precipitation:
    path: climate/pr.nc
    crs: EPSG:4326
    temporal: true
    variable: pr
landcover:
  corine:
    path: landcover/corine.nc
    crs: EPSG:3035
"#,
    )?;
    assert_eq!(catalog.len(), 3);

    let info = catalog.get("climate", "temperature")?;
    assert_eq!(info.path, "climate/tas.nc");
    assert!(info.temporal);
    assert_eq!(info.variable, None);

    let corine = catalog.get("landcover", "corine")?;
    assert_eq!(corine.crs, Crs::ETRS89_LAEA);
    assert!(!corine.temporal);
    assert!(corine.description.is_empty());

    let order: Vec<(&str, &str)> = catalog.iter().map(|(c, s, _)| (c, s)).collect();
    assert_eq!(
        order,
        vec![
            ("climate", "precipitation"),
            ("climate", "temperature"),
            ("landcover", "corine")
        ]
    );

    assert!(matches!(
        catalog.get("climate", "snow"),
        Err(BasinGridError::DatasetNotFound { .. })
    ));

    let mut catalog = DatasetCatalog::default();
    assert!(catalog.is_empty());
    catalog.insert(
        "hydro",
        "discharge",
        DatasetInfo {
            path: "hydro/q.nc".to_string(),
            crs: Crs::WGS84,
            temporal: true,
            description: String::new(),
            variable: Some("q".to_string()),
        },
    );
    assert_eq!(catalog.get("hydro", "discharge")?.variable.as_deref(), Some("q"));

    let dir = tempdir().expect("Failed to create temp dir");
    assert!(matches!(
        DatasetCatalog::from_file(&dir.path().join("catalog.yaml")),
        Err(BasinGridError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn test_time_range_parsing() {
    let range = TimeRange::parse("2000-01-01", "2000-12-31").unwrap();
    assert_eq!(range.start.to_string(), "2000-01-01 00:00:00");
    assert!(range.end.to_string().starts_with("2000-12-31 23:59:59"));

    let exact = TimeRange::parse("2000-01-01T06:00:00", "2000-01-01T18:00:00").unwrap();
    assert_eq!(exact.end.to_string(), "2000-01-01 18:00:00");

    assert!(matches!(
        TimeRange::parse("yesterday", "2000-01-01"),
        Err(BasinGridError::TimeError(_))
    ));
}
