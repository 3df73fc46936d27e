use color_eyre::Result;
use color_eyre::eyre::Context;
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "booking-directory";

/// Targets that flood `debug` with per-statement output unless asked for.
const QUIET_TARGETS: &[&str] = &["sea_orm", "sea_orm_migration", "sqlx"];

/// Keeps the span exporter alive; call [`Telemetry::shutdown`] before exit so
/// batched spans are flushed.
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    pub fn shutdown(self) -> Result<()> {
        if let Some(provider) = self.provider {
            provider
                .shutdown()
                .wrap_err("Failed to shut down tracer provider")?;
        }
        Ok(())
    }
}

/// Installs the global subscriber: stderr output filtered by `level`, plus
/// span export when `otlp_endpoint` is set. `log` records are bridged.
pub fn init_tracing(level: &str, otlp_endpoint: Option<&str>) -> Result<Telemetry> {
    let filter = env_filter(level)?;
    let provider = otlp_endpoint.map(otlp_provider).transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .with(otel_layer)
        .init();

    Ok(Telemetry { provider })
}

/// Parses `level` and caps the ORM's own targets at `warn` unless `level`
/// names them.
fn env_filter(level: &str) -> Result<EnvFilter> {
    let mut directives = level.to_string();
    for target in QUIET_TARGETS {
        let named = level
            .split(',')
            .any(|d| d.trim().split('=').next() == Some(*target));
        if !named {
            directives.push_str(&format!(",{target}=warn"));
        }
    }
    EnvFilter::try_new(&directives)
        .wrap_err_with(|| format!("Invalid log filter: {level}"))
}

fn otlp_provider(endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .wrap_err("Failed to create OTLP span exporter")?;

    let resource = Resource::builder()
        .with_attributes([KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            SERVICE_NAME,
        )])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orm_targets_are_capped() {
        let filter = env_filter("debug").unwrap().to_string();
        assert!(filter.contains("sqlx=warn"), "{filter}");
        assert!(filter.contains("sea_orm=warn"), "{filter}");
    }

    #[test]
    fn test_named_orm_target_is_left_alone() {
        let filter = env_filter("info,sqlx=trace").unwrap().to_string();
        assert!(filter.contains("sqlx=trace"), "{filter}");
        assert!(!filter.contains("sqlx=warn"), "{filter}");
        assert!(filter.contains("sea_orm=warn"), "{filter}");
    }

    #[test]
    fn test_invalid_filter_is_an_error() {
        assert!(env_filter("booking_directory=loud").is_err());
    }
}
