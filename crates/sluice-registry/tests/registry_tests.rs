//! Integration tests for Registry object operations

use chrono::{Duration, TimeZone, Utc};
use sluice_core::{
    BatchFeatureView, DataSource, Entity, FeatureService, FeatureView, Field, ObjectKind,
    OnDemandFeatureView, RequestSource, SavedDataset, TransformMode, TransformationRef,
    ValidationReference, ValueType,
};
use sluice_registry::{MemoryRegistryStore, Registry, RegistryConfig, RegistryError};

const PROJECT: &str = "feast_demo";

fn driver() -> Entity {
    Entity::new("driver", "driver_id").with_description("driver id")
}

fn driver_stats_source() -> DataSource {
    DataSource::file("driver_hourly_stats_source", "data/driver_stats.parquet")
        .with_timestamp_field("event_timestamp")
        .with_created_timestamp_column("created")
}

fn driver_hourly_stats() -> BatchFeatureView {
    BatchFeatureView::new("driver_hourly_stats", driver_stats_source())
        .with_entity(&driver())
        .with_ttl(std::time::Duration::from_secs(86_400))
        .with_schema(vec![
            Field::new("driver_id", ValueType::Int64),
            Field::new("conv_rate", ValueType::Float32),
            Field::new("acc_rate", ValueType::Float32),
            Field::new("avg_daily_trips", ValueType::Int64),
        ])
        .with_online(true)
}

fn transformed_conv_rate() -> OnDemandFeatureView {
    let stats: FeatureView = driver_hourly_stats().into();
    OnDemandFeatureView::new(
        "transformed_conv_rate",
        TransformationRef::new("transformed_conv_rate", TransformMode::Pandas),
    )
    .with_feature_view(&stats)
    .with_request_source(RequestSource::new(
        "vals_to_add",
        vec![Field::new("val_to_add", ValueType::Int64)],
    ))
    .with_schema(vec![Field::new("conv_rate_plus_val1", ValueType::Float64)])
}

// =============================================================================
// Apply / get
// =============================================================================

#[test]
fn test_apply_get_roundtrip_every_kind() {
    let mut registry = Registry::in_memory();

    registry.apply_entity(driver(), PROJECT).unwrap();
    registry.apply_data_source(driver_stats_source(), PROJECT).unwrap();
    registry.apply_feature_view(driver_hourly_stats(), PROJECT).unwrap();
    registry.apply_feature_view(transformed_conv_rate(), PROJECT).unwrap();
    registry
        .apply_feature_service(
            FeatureService::new("driver_activity").with_projection(driver_hourly_stats().projection()),
            PROJECT,
        )
        .unwrap();
    registry
        .apply_saved_dataset(SavedDataset::new("my_training_ds", "data/my_training_ds.parquet"), PROJECT)
        .unwrap();
    registry
        .apply_validation_reference(ValidationReference::new("ref", "my_training_ds"), PROJECT)
        .unwrap();

    assert_eq!(registry.get_entity("driver", PROJECT).unwrap(), driver());
    assert_eq!(
        registry.get_data_source("driver_hourly_stats_source", PROJECT).unwrap(),
        driver_stats_source()
    );
    assert_eq!(
        registry.get_feature_view("driver_hourly_stats", PROJECT).unwrap(),
        driver_hourly_stats()
    );
    assert_eq!(
        registry
            .get_on_demand_feature_view("transformed_conv_rate", PROJECT)
            .unwrap(),
        transformed_conv_rate()
    );
    assert_eq!(
        registry.get_saved_dataset("my_training_ds", PROJECT).unwrap().storage,
        "data/my_training_ds.parquet"
    );
    assert_eq!(
        registry.get_validation_reference("ref", PROJECT).unwrap().dataset_name,
        "my_training_ds"
    );
    assert!(registry.get_feature_service("driver_activity", PROJECT).is_ok());
}

#[test]
fn test_duplicate_apply_fails() {
    let mut registry = Registry::in_memory();
    registry.apply_entity(driver(), PROJECT).unwrap();

    let err = registry.apply_entity(driver(), PROJECT).unwrap_err();
    match err {
        RegistryError::DuplicateObject {
            kind,
            name,
            project,
        } => {
            assert_eq!(kind, ObjectKind::Entity);
            assert_eq!(name, "driver");
            assert_eq!(project, PROJECT);
        }
        other => panic!("Expected DuplicateObject, got {:?}", other),
    }
}

#[test]
fn test_unique_view_names_hold_across_every_view_kind() {
    let config = RegistryConfig::memory().with_unique_feature_view_names(true);
    let mut registry = Registry::new(MemoryRegistryStore::new(), config);
    registry.apply_feature_view(driver_hourly_stats(), PROJECT).unwrap();

    let mut clash = transformed_conv_rate();
    clash.name = "driver_hourly_stats".to_string();
    let err = registry.apply_feature_view(clash, PROJECT).unwrap_err();
    match err {
        RegistryError::DuplicateObject { kind, name, .. } => {
            assert_eq!(kind, ObjectKind::BatchFeatureView);
            assert_eq!(name, "driver_hourly_stats");
        }
        other => panic!("Expected DuplicateObject, got {:?}", other),
    }
    assert!(registry.list_on_demand_feature_views(PROJECT).is_empty());
}

#[test]
fn test_get_returns_independent_copy() {
    let mut registry = Registry::in_memory();
    registry.apply_entity(driver(), PROJECT).unwrap();

    let mut copy = registry.get_entity("driver", PROJECT).unwrap();
    copy.description = "changed".to_string();

    assert_eq!(
        registry.get_entity("driver", PROJECT).unwrap().description,
        "driver id"
    );
}

#[test]
fn test_created_timestamp_survives_reapply() {
    let mut registry = Registry::in_memory();
    registry.apply_entity(driver(), PROJECT).unwrap();
    let first = registry.get_entity("driver", PROJECT).unwrap();

    registry.delete_entity("driver", PROJECT).unwrap();
    registry.apply_entity(first.clone(), PROJECT).unwrap();
    let second = registry.get_entity("driver", PROJECT).unwrap();

    assert_eq!(second.meta.created_timestamp, first.meta.created_timestamp);
    assert!(second.meta.last_updated_timestamp >= first.meta.last_updated_timestamp);
}

#[test]
fn test_caller_supplied_last_updated_is_replaced() {
    let future = Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap();
    let mut entity = driver();
    entity.meta.created_timestamp = Some(future);
    entity.meta.last_updated_timestamp = Some(future);

    let mut registry = Registry::in_memory();
    registry.apply_entity(entity, PROJECT).unwrap();
    let stored = registry.get_entity("driver", PROJECT).unwrap();

    assert!(stored.meta.last_updated_timestamp.unwrap() <= Utc::now());
    assert_eq!(stored.meta.created_timestamp, Some(future));
}

#[test]
fn test_materialization_advances_server_set_last_updated() {
    let future = Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap();
    let mut view = driver_hourly_stats();
    view.meta.last_updated_timestamp = Some(future);

    let mut registry = Registry::in_memory();
    registry.apply_feature_view(view, PROJECT).unwrap();
    let applied = registry.get_feature_view("driver_hourly_stats", PROJECT).unwrap();

    let end = Utc::now();
    registry
        .apply_materialization("driver_hourly_stats", PROJECT, end - Duration::hours(1), end)
        .unwrap();
    let materialized = registry.get_feature_view("driver_hourly_stats", PROJECT).unwrap();

    let last_updated = materialized.meta.last_updated_timestamp.unwrap();
    assert!(last_updated >= applied.meta.last_updated_timestamp.unwrap());
    assert!(last_updated <= Utc::now());
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_then_get_fails() {
    let mut registry = Registry::in_memory();
    registry.apply_entity(driver(), PROJECT).unwrap();
    registry.delete_entity("driver", PROJECT).unwrap();

    assert!(registry.get_entity("driver", PROJECT).unwrap_err().is_not_found());
    assert!(registry.delete_entity("driver", PROJECT).unwrap_err().is_not_found());
}

#[test]
fn test_delete_missing_feature_view_fails() {
    let mut registry = Registry::in_memory();
    let err = registry.delete_feature_view("nope", PROJECT).unwrap_err();
    assert!(matches!(err, RegistryError::ObjectNotFound { .. }));
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn test_list_has_no_cross_project_leakage() {
    for order in [["a", "b"], ["b", "a"]] {
        let mut registry = Registry::in_memory();
        for project in order {
            registry.apply_entity(driver(), project).unwrap();
            registry
                .apply_entity(Entity::new(format!("{}_only", project), "id"), project)
                .unwrap();
        }

        let names: Vec<_> = registry
            .list_entities("a")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a_only", "driver"]);
        assert!(registry.list_entities("c").is_empty());
    }
}

#[test]
fn test_driver_scenario() {
    let mut registry = Registry::in_memory();
    registry.apply_entity(driver(), PROJECT).unwrap();
    registry.apply_feature_view(driver_hourly_stats(), PROJECT).unwrap();

    let views = registry.list_feature_views(PROJECT);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].name, "driver_hourly_stats");
    assert!(views[0].online);
    assert_eq!(views[0].entities, vec!["driver"]);

    let err = registry
        .apply_feature_view(driver_hourly_stats(), PROJECT)
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateObject { .. }));
}

#[test]
fn test_list_feature_views_by_kind() {
    let mut registry = Registry::in_memory();
    registry.apply_feature_view(driver_hourly_stats(), PROJECT).unwrap();
    registry.apply_feature_view(transformed_conv_rate(), PROJECT).unwrap();

    let on_demand = registry
        .list_feature_views_by_kind("on_demand", PROJECT)
        .unwrap();
    assert_eq!(on_demand.len(), 1);
    assert_eq!(on_demand[0].name(), "transformed_conv_rate");

    assert!(registry
        .list_feature_views_by_kind("stream", PROJECT)
        .unwrap()
        .is_empty());
    assert!(matches!(
        registry.list_feature_views_by_kind("BATCH", PROJECT),
        Err(RegistryError::UnknownObjectKind(_))
    ));
}

// =============================================================================
// Materialization
// =============================================================================

#[test]
fn test_materialization_intervals_accumulate_in_order() {
    let mut registry = Registry::in_memory();
    registry.apply_feature_view(driver_hourly_stats(), PROJECT).unwrap();

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut last_updated = registry
        .get_feature_view("driver_hourly_stats", PROJECT)
        .unwrap()
        .meta
        .last_updated_timestamp;

    for day in 0..3 {
        let start = base + Duration::days(day);
        registry
            .apply_materialization("driver_hourly_stats", PROJECT, start, start + Duration::days(1))
            .unwrap();

        let view = registry.get_feature_view("driver_hourly_stats", PROJECT).unwrap();
        assert!(view.meta.last_updated_timestamp >= last_updated);
        last_updated = view.meta.last_updated_timestamp;
    }

    let view = registry.get_feature_view("driver_hourly_stats", PROJECT).unwrap();
    let starts: Vec<_> = view
        .materialization_intervals
        .iter()
        .map(|i| i.start)
        .collect();
    assert_eq!(
        starts,
        vec![base, base + Duration::days(1), base + Duration::days(2)]
    );
}

#[test]
fn test_materialization_unknown_view() {
    let mut registry = Registry::in_memory();
    let now = Utc::now();
    let err = registry
        .apply_materialization("transformed_conv_rate", PROJECT, now, now)
        .unwrap_err();
    assert!(err.is_not_found());
}
