//! Telemetry bootstrap and graceful-shutdown helpers for the facilitator binary.

mod sig_down;

pub use sig_down::SigDown;

use std::env;

/// Protocol used to export OpenTelemetry traces/metrics via OTLP.
#[cfg(feature = "telemetry")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelemetryProtocol {
    Http,
    Grpc,
}

#[cfg(feature = "telemetry")]
impl TelemetryProtocol {
    /// Reads the OTLP protocol from the environment, returning `None` if OTLP
    /// export isn't configured at all.
    fn from_env() -> Option<Self> {
        let configured = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
        if !configured {
            return None;
        }
        Some(match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
            Ok("grpc") => Self::Grpc,
            _ => Self::Http,
        })
    }
}

#[cfg(feature = "telemetry")]
fn resource() -> opentelemetry_sdk::Resource {
    use opentelemetry::KeyValue;
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };

    let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_owned());
    opentelemetry_sdk::Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_schema_url(
            [
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
            ],
            SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "telemetry")]
fn init_tracer_provider(protocol: TelemetryProtocol) -> opentelemetry_sdk::trace::SdkTracerProvider {
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};

    let exporter = opentelemetry_otlp::SpanExporter::builder();
    let exporter = match protocol {
        TelemetryProtocol::Http => exporter.with_http().build(),
        TelemetryProtocol::Grpc => exporter.with_tonic().build(),
    }
    .expect("failed to build OTLP span exporter");

    SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(1.0))))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build()
}

#[cfg(feature = "telemetry")]
fn init_meter_provider(protocol: TelemetryProtocol) -> opentelemetry_sdk::metrics::SdkMeterProvider {
    use opentelemetry::global;
    use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader};

    let exporter = opentelemetry_otlp::MetricExporter::builder();
    let exporter = match protocol {
        TelemetryProtocol::Http => exporter
            .with_http()
            .with_temporality(opentelemetry_sdk::metrics::Temporality::default())
            .build(),
        TelemetryProtocol::Grpc => exporter
            .with_tonic()
            .with_temporality(opentelemetry_sdk::metrics::Temporality::default())
            .build(),
    }
    .expect("failed to build OTLP metric exporter");

    let reader = PeriodicReader::builder(exporter)
        .with_interval(std::time::Duration::from_secs(30))
        .build();
    let stdout_reader =
        PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default()).build();

    let meter_provider = MeterProviderBuilder::default()
        .with_resource(resource())
        .with_reader(reader)
        .with_reader(stdout_reader)
        .build();

    global::set_meter_provider(meter_provider.clone());
    meter_provider
}

/// Installs the process-wide tracing subscriber and, when the `telemetry`
/// feature is enabled and `OTEL_EXPORTER_OTLP_*` is set, an OpenTelemetry
/// export pipeline. Keep the returned value alive for the process lifetime —
/// dropping it flushes and shuts down the exporters.
#[cfg(feature = "telemetry")]
#[derive(Debug)]
pub struct Telemetry {
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
    meter_provider: Option<opentelemetry_sdk::metrics::SdkMeterProvider>,
}

#[cfg(feature = "telemetry")]
impl Telemetry {
    /// Initializes tracing, exporting to OTLP when configured via environment
    /// variables and falling back to local formatted logs otherwise.
    #[must_use]
    pub fn init() -> Self {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

        match TelemetryProtocol::from_env() {
            Some(protocol) => {
                let tracer_provider = init_tracer_provider(protocol);
                let meter_provider = init_meter_provider(protocol);
                let tracer =
                    opentelemetry::trace::TracerProvider::tracer(&tracer_provider, "t402-facilitator");

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(tracing_opentelemetry::MetricsLayer::new(meter_provider.clone()))
                    .with(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
                    .init();

                tracing::info!(?protocol, "OTLP export enabled");
                Self {
                    tracer_provider: Some(tracer_provider),
                    meter_provider: Some(meter_provider),
                }
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                Self { tracer_provider: None, meter_provider: None }
            }
        }
    }
}

#[cfg(feature = "telemetry")]
impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.as_ref() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {e:?}");
            }
        }
        if let Some(provider) = self.meter_provider.as_ref() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down meter provider: {e:?}");
            }
        }
    }
}

/// Installs a plain formatted-logging tracing subscriber (no OpenTelemetry export).
#[cfg(not(feature = "telemetry"))]
#[derive(Debug)]
pub struct Telemetry;

#[cfg(not(feature = "telemetry"))]
impl Telemetry {
    /// Initializes local formatted logging.
    #[must_use]
    pub fn init() -> Self {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        Self
    }
}
