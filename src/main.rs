//! Procurement Risk Pipeline - Main Entry Point
//!
//! Consumes contract, batch and ingest requests from NATS, scores them against
//! the loaded regressor and publishes verdicts or structured failures.

use anyhow::{Context, Result};
use futures::StreamExt;
use procurement_risk_pipeline::{
    audit::AuditLog,
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    feature_extractor::FeatureExtractor,
    handler::RequestHandler,
    metrics::{MetricsReporter, PipelineMetrics},
    models::{BatchAggregator, ModelInfo, ModelLoader, RiskScorer},
    producer::VerdictProducer,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?
        .add_directive("procurement_risk_pipeline=info".parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Procurement Risk Pipeline");
    info!(
        "Risk tiers: moderate>={:.2}, high>={:.2}, critical>={:.2}",
        config.scoring.risk_levels.moderate,
        config.scoring.risk_levels.high,
        config.scoring.risk_levels.critical
    );

    // Load the regressor; a failed load still starts the worker
    let model = ModelLoader::load(&config.model);
    let model_info = ModelInfo::describe(model.as_ref());
    if model_info.model_loaded {
        info!(
            model = ?model_info.model_name,
            features = model_info.feature_count,
            "Risk model ready"
        );
    } else {
        warn!("Risk model unavailable, scoring requests will fail with service_unavailable");
    }

    let scorer = RiskScorer::new(
        model,
        FeatureExtractor::with_encoded_prior(config.model.encoded_prior),
        config.scoring.risk_levels.clone(),
    );

    let audit = if config.audit.enabled {
        info!(path = %config.audit.path, "Audit trail enabled");
        AuditLog::open(&config.audit.path)
    } else {
        AuditLog::disabled()
    };

    let metrics = Arc::new(PipelineMetrics::new());
    let handler = Arc::new(RequestHandler::new(
        BatchAggregator::new(scorer),
        audit,
        metrics.clone(),
    ));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats);
    let router = consumer.router().clone();
    let producer = VerdictProducer::new(
        client.clone(),
        &config.nats.verdict_subject,
        &config.nats.error_subject,
    );

    let num_workers = config.pipeline.workers;
    info!("Starting request loop with {} parallel workers", num_workers);
    info!("Publishing verdicts to: {}", config.nats.verdict_subject);
    info!("Publishing failures to: {}", config.nats.error_subject);

    // Semaphore to limit concurrent scoring
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let Some(kind) = router.classify(&message) else {
            warn!(subject = %message.subject, "Ignoring message on unknown subject");
            continue;
        };

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Worker semaphore closed");
                break;
            }
        };

        let handler = handler.clone();
        let producer = producer.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let request_id = Uuid::new_v4().to_string();
            let reply = message.reply.as_deref();

            let outcome = handler
                .clone()
                .handle_blocking(kind, message.payload.clone(), request_id.clone())
                .await;

            let published = match outcome {
                Ok(result) => producer.publish_result(reply, &result).await,
                Err(failure) => producer.publish_error(reply, &failure).await,
            };

            if let Err(e) = published {
                error!(request_id = %request_id, error = %e, "Failed to publish reply");
            } else {
                debug!(request_id = %request_id, kind = ?kind, "Reply published");
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let stats = handler.metrics().get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} contracts/s", handler.metrics().get_throughput()),
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
