//! Driver statistics example
//!
//! This example demonstrates:
//! - Registering entities, sources and feature views in a file-backed registry
//! - Reloading the committed catalog
//! - Running an on-demand transformation in both naming conventions

use sluice_core::{
    BatchFeatureView, DataSource, Entity, FeatureView, Field, OnDemandFeatureView, RequestSource,
    TransformMode, TransformationRef, Value, ValueType,
};
use sluice_registry::{Registry, RegistryConfig};
use sluice_runtime::{
    DataSourceConnector, FeatureTable, InMemoryConnector, OnDemandEngine, Row, TransformError,
    TransformRegistry, Transformation,
};

const PROJECT: &str = "feast_demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Driver Stats Example ===\n");

    let config = RegistryConfig::from_yaml_file("demos/registry.yaml")?;
    let mut registry = Registry::from_config(config.clone()).await?;

    let driver = Entity::new("driver", "driver_id").with_description("driver id");
    let source = DataSource::file("driver_hourly_stats_source", "data/driver_stats.parquet")
        .with_timestamp_field("event_timestamp")
        .with_created_timestamp_column("created");
    let stats = BatchFeatureView::new("driver_hourly_stats", source.clone())
        .with_entity(&driver)
        .with_ttl(std::time::Duration::from_secs(86_400))
        .with_schema(vec![
            Field::new("driver_id", ValueType::Int64),
            Field::new("conv_rate", ValueType::Float32),
            Field::new("acc_rate", ValueType::Float32),
        ]);
    let odfv = OnDemandFeatureView::new(
        "transformed_conv_rate",
        TransformationRef::new("transformed_conv_rate", TransformMode::Python)
            .with_body_text("conv_rate + val_to_add"),
    )
    .with_feature_view(&FeatureView::from(stats.clone()))
    .with_request_source(RequestSource::new(
        "vals_to_add",
        vec![Field::new("val_to_add", ValueType::Int64)],
    ))
    .with_schema(vec![Field::new("conv_rate_plus_val", ValueType::Float64)]);

    if registry.get_entity("driver", PROJECT).is_err() {
        registry.apply_entity(driver, PROJECT)?;
        registry.apply_data_source(source.clone(), PROJECT)?;
        registry.apply_feature_view(stats, PROJECT)?;
        registry.apply_feature_view(odfv, PROJECT)?;
        registry.commit().await?;
        println!("Applied and committed catalog version {}", registry.version());
    }

    // A fresh registry sees the committed catalog
    let registry = Registry::from_config(config).await?;
    for view in registry.list_all_feature_views(PROJECT) {
        println!("  {} ({})", view.name(), view.kind());
    }

    let mut transforms = TransformRegistry::new();
    transforms.register(
        "transformed_conv_rate",
        Transformation::row(|row| {
            let conv_rate = row
                .get("conv_rate")
                .and_then(Value::as_f64)
                .ok_or_else(|| TransformError::MissingInput("conv_rate".to_string()))?;
            let val_to_add = row
                .get("val_to_add")
                .and_then(Value::as_f64)
                .ok_or_else(|| TransformError::MissingInput("val_to_add".to_string()))?;
            let mut out = Row::new();
            out.insert("conv_rate_plus_val".to_string(), Value::Float(conv_rate + val_to_add));
            Ok(out)
        }),
    );
    let engine = OnDemandEngine::new(transforms);

    let connector = InMemoryConnector::new();
    connector
        .register(
            "data/driver_stats.parquet",
            FeatureTable::from_columns(vec![
                ("driver_id", vec![Value::Int(1001), Value::Int(1002)]),
                ("conv_rate", vec![Value::Float(0.5), Value::Float(0.25)]),
            ])?,
        )
        .await;
    let mut batch = connector.table_handle(&source, None).await?.table;
    batch.insert_column("val_to_add", vec![Value::Int(10), Value::Int(20)])?;

    let odfv = registry.get_on_demand_feature_view("transformed_conv_rate", PROJECT)?;
    let inferred = engine.infer_schema(&odfv)?;
    println!("\nOutput schema:");
    for field in &inferred.features {
        println!("  {}: {}", field.name, field.dtype);
    }

    for full_feature_names in [false, true] {
        let output = engine.transform(&odfv, &batch, full_feature_names)?;
        println!("\nfull_feature_names = {}", full_feature_names);
        for (name, values) in output.columns() {
            println!("  {} = {:?}", name, values);
        }
    }

    Ok(())
}
