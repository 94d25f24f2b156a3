use anyhow::{Context, Result};
use clap::Parser;
use measurement_feed::cli::Args;
use measurement_feed::config::Config;
use measurement_feed::{FeedSource, HttpSource, MeasurementFeed};
use serde::Serialize;
use std::sync::Arc;

fn init_tracing(config: &Config) -> Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime::Tokio, trace::Config as OTelTraceConfig, Resource};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,measurement_feed=info".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    if let Some(endpoint) = &config.otlp_endpoint {
        let endpoint = normalize_otlp_http_endpoint(endpoint);
        let exporter = opentelemetry_otlp::new_exporter()
            .http()
            .with_endpoint(endpoint);
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .with_trace_config(OTelTraceConfig::default().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "measurement-feed"),
            ])))
            .install_batch(Tokio)?;

        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

fn normalize_otlp_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.contains("/v1/traces") {
        return trimmed.to_string();
    }
    format!("{}/v1/traces", trimmed.trim_end_matches('/'))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!(error = %err, "failed to encode json line"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env()?;
    args.apply(&mut config);
    config.validate()?;
    init_tracing(&config)?;

    let source = HttpSource::from_config(&config).context("failed to build HTTP client")?;

    if args.list_sensors {
        let sensors = source
            .list_sensors()
            .await
            .context("failed to list sensors")?;
        for id in sensors {
            println!("{id}");
        }
        return Ok(());
    }

    let mut feed =
        MeasurementFeed::new(Arc::new(source)).with_poll_interval(config.poll_interval());

    let json = args.json;
    feed.on_initial(move |readings| {
        if json {
            readings.iter().for_each(|reading| print_json(reading));
        } else {
            tracing::info!(
                count = readings.len(),
                latest = ?readings.last().map(|r| r.value),
                "initial readings available"
            );
        }
    });
    feed.on_update(move |reading| {
        if json {
            print_json(reading);
        } else {
            tracing::info!(
                timestamp = %reading.timestamp,
                value = reading.value,
                "new reading"
            );
        }
    });

    feed.start()?;
    tracing::info!(
        base_url = %config.base_url,
        sensor = %config.sensor_id,
        "following sensor"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    feed.stop();

    let stats = feed.stats().snapshot();
    if json {
        print_json(&stats);
    }
    tracing::info!(
        requests = stats.requests_issued,
        failed = stats.failed_requests,
        readings = stats.readings_appended,
        skipped = stats.lines_skipped,
        "measurement feed finished"
    );

    Ok(())
}
