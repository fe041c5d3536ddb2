//! Icinga check for Elasticsearch.
//!
//! Checks the general health of the cluster, or counts documents matching a
//! query over a time window and compares the count against thresholds,
//! optionally with a top-N breakdown. Reports through the plugin convention:
//! one stdout line and an exit code of 0/1/2/3.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use escheck::elasticsearch::{
    build_search, health, metric, query, Dialect, EsClient, MetricResult, QuerySpec,
    ThresholdPolicy, TlsOptions,
};
use escheck::{CheckStatus, Severity};

#[derive(Parser, Debug)]
#[command(name = "check_elasticsearch_cluster", version)]
#[command(about = "Icinga check for Elasticsearch")]
struct Args {
    /// Elasticsearch host
    #[arg(long)]
    host: String,

    /// Port that Elasticsearch is running on (eg. 9200)
    #[arg(long, default_value_t = 9200)]
    port: u16,

    /// Connect using HTTPS
    #[arg(long)]
    ssl: bool,

    /// Do not verify the HTTPS cert
    #[arg(long)]
    ssl_insecure: bool,

    /// Client cert for HTTPS auth (PEM)
    #[arg(long)]
    ssl_cert: Option<PathBuf>,

    /// Client key for HTTPS auth (PEM)
    #[arg(long)]
    ssl_key: Option<PathBuf>,

    /// Uri prefix, for example /elasticsearch
    #[arg(long, default_value = "")]
    uri: String,

    /// Check command
    #[arg(long, value_enum, default_value = "health")]
    command: Command,

    /// The index you want to query, for example logstash-*
    #[arg(long, default_value = "logstash-*")]
    index: String,

    /// e.g: source:localhorst AND message:login failed
    #[arg(long)]
    query: Option<String>,

    /// Critical threshold, e.g. 1, 100
    #[arg(long)]
    critical: Option<u64>,

    /// Warning threshold, e.g. 1, 20
    #[arg(long)]
    warning: Option<u64>,

    /// Alert when the value falls below the threshold instead of above it
    #[arg(long)]
    invert: bool,

    /// Time window to search over, e.g: 1h, 15m, 32d
    #[arg(long, default_value = "5m")]
    duration: String,

    /// Display top hits for the query
    #[arg(long)]
    top: Option<u64>,

    /// Name of the field you want in your top analysis
    #[arg(long)]
    field: Option<String>,

    /// Query API dialect of the target cluster
    #[arg(long, value_enum, default_value = "legacy")]
    api_version: Dialect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Command {
    Health,
    Metric,
}

#[tokio::main]
async fn main() {
    // The plugin protocol owns stdout, so diagnostics go to stderr and stay
    // silent unless RUST_LOG is set.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    run(args).await.exit()
}

async fn run(args: Args) -> CheckStatus {
    if !query::validate_duration(&args.duration) {
        return CheckStatus::new(
            Severity::Unknown,
            format!(
                "invalid duration {:?}, expected something like 1h, 15m or 32d",
                args.duration
            ),
        );
    }

    let tls = TlsOptions {
        insecure: args.ssl_insecure,
        cert: args.ssl_cert.clone(),
        key: args.ssl_key.clone(),
    };
    let scheme = if args.ssl || tls.requested() {
        "https"
    } else {
        "http"
    };

    let client = match EsClient::new(scheme, &args.host, args.port, &args.uri, &tls) {
        Ok(client) => client,
        Err(err) => return CheckStatus::new(Severity::Unknown, err.to_string()),
    };

    match args.command {
        Command::Health => check_health(&client).await,
        Command::Metric => check_metric(&client, &args).await,
    }
}

async fn check_health(client: &EsClient) -> CheckStatus {
    match client.cluster_health().await {
        Ok(cluster) => health::evaluate(&cluster),
        // DNS, refused connection, TLS handshake: the check itself could
        // not run, which says nothing about the cluster.
        Err(err) => CheckStatus::new(
            Severity::Unknown,
            format!("Error fetching cluster health: {}", err),
        ),
    }
}

async fn check_metric(client: &EsClient, args: &Args) -> CheckStatus {
    let Some(query_text) = args.query.clone() else {
        return CheckStatus::new(
            Severity::Unknown,
            "--query is required for the metric command",
        );
    };

    let spec = QuerySpec {
        query: query_text,
        duration: args.duration.clone(),
        index: args.index.clone(),
        top: args.top,
        field: args.field.clone(),
    };
    let policy = ThresholdPolicy {
        warning: args.warning,
        critical: args.critical,
        invert: args.invert,
    };

    let (suffix, body) = build_search(&spec, args.api_version);
    let response = match client.search(&spec.index, &suffix, &body).await {
        Ok(response) => response,
        // A query that cannot be evaluated is treated as worse than a
        // breached threshold.
        Err(err) => {
            return CheckStatus::new(Severity::Critical, format!("Error making the query: {}", err))
        }
    };

    match MetricResult::from_response(&response, spec.field.as_deref()) {
        Ok(result) => metric::evaluate(&result, &policy, &spec),
        Err(err) => {
            CheckStatus::new(Severity::Critical, format!("Error making the query: {}", err))
        }
    }
}
