use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use node_status::{
    AlertSet,
    alerts::{self, AlertSourceClient, AlertStatus},
    config::{dedup_nodes, read_config_file},
    control::AsteriskClient,
    publisher::NodePublisher,
    recorder::{FileRecorder, NoopRecorder, Recorder},
    samplers,
};
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("node_status", LevelFilter::TRACE),
        ("node_status_update", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    // a missing config file is the only condition worth a non-zero exit to
    // the invoking scheduler
    if !Path::new(&args.file).exists() {
        error!("configuration file {} not found", args.file);
        std::process::exit(1);
    }

    let config = read_config_file(&args.file)?;

    let nodes = dedup_nodes(&config.nodes);
    if nodes.is_empty() {
        info!("no nodes configured, nothing to do");
        return Ok(());
    }

    let recorder: Arc<dyn Recorder> = match FileRecorder::open(
        &config.alert_source.trail_log,
        &config.alert_source.error_log,
    ) {
        Ok(recorder) => Arc::new(recorder),
        Err(e) => {
            error!("cannot open diagnostic logs: {e}");
            Arc::new(NoopRecorder)
        }
    };

    let metrics = samplers::sample(&config.weather).await;
    debug!("sampled host metrics: {metrics:?}");

    let source = AlertSourceClient::new(&config.alert_source, recorder.clone());
    let resolution = source.fetch(&nodes).await;

    let custom_link = config.alert_source.custom_link.as_deref();
    let mut rendered_alerts = HashMap::new();
    for node in &nodes {
        let text = match resolution.for_node(node) {
            AlertStatus::Disabled => alerts::render(false, &AlertSet::default(), None, None),
            AlertStatus::Ready(set) => {
                alerts::render(true, set, custom_link, Some(alerts::ALERT_MAX_LEN))
            }
            AlertStatus::Failed(failure) => alerts::placeholder(*failure),
        };
        rendered_alerts.insert(node.clone(), text);
    }

    let publisher = NodePublisher::new(Arc::new(AsteriskClient::new()), recorder);
    let outcomes = publisher.publish(&nodes, &metrics, &rendered_alerts).await;

    for node in &nodes {
        if let Some(outcome) = outcomes.get(node) {
            info!("node {node}: {outcome:?}");
        }
    }

    Ok(())
}
