//! Behavior Gate entrypoint: replays a recorded login session through capture,
//! feature extraction and the risk classifier, then prints one audit line.
//!
//! Usage: `behavior-gate <trace.json> [user_id]`

use behavior_gate::{
    collectors::{ScriptedSource, SessionTrace, Viewport},
    config::AppConfig,
    logging::{AuditEvent, StructuredLogger},
    orchestrator::LoginFlow,
    risk::RiskClient,
    storage::SessionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

fn open_store(config: &AppConfig) -> Option<Arc<SessionStore>> {
    if !config.store.enabled {
        return None;
    }
    if let Err(e) = std::fs::create_dir_all(&config.store.data_dir) {
        warn!(data_dir = ?config.store.data_dir, error = %e, "store disabled");
        return None;
    }
    let path = config.store.data_dir.join("sessions.db");
    match SessionStore::open(&path, config.store.secret.as_bytes()) {
        Ok(s) => Some(Arc::new(s)),
        Err(e) => {
            warn!(path = ?path, error = %e, "store disabled");
            None
        }
    }
}

async fn run(
    config: AppConfig,
    trace: SessionTrace,
    user_id: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = open_store(&config);
    let client = RiskClient::new(&config.risk)?;
    info!(url = client.url(), store = store.is_some(), "classifier configured");

    let viewport = trace.viewport.unwrap_or(Viewport::new(0.0, 0.0));
    let mut source = ScriptedSource::new(viewport);
    let mut flow = LoginFlow::new(&config, client, store, trace.started_at);

    flow.collector_mut().attach(&mut source, trace.region);
    source.replay(&trace.events);
    if trace.honeypot {
        flow.collector().trigger_honeypot();
    }
    flow.collector_mut().detach(&mut source);
    info!(events = trace.events.len(), "trace replayed");

    let state = flow.submit_at(user_id, trace.submitted_at()).await?;
    let outcome = flow.outcome();
    let audit = AuditEvent::new(user_id, state, outcome.as_ref(), flow.record_id());
    StructuredLogger::emit_json(&audit, &mut std::io::stdout());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("GATE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = AppConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let mut args = std::env::args().skip(1);
    let trace_path = args
        .next()
        .map(PathBuf::from)
        .ok_or("usage: behavior-gate <trace.json> [user_id]")?;
    let user_id = args.next().unwrap_or_else(|| "anonymous".to_string());

    let trace: SessionTrace = serde_json::from_str(&std::fs::read_to_string(&trace_path)?)?;
    info!(trace = ?trace_path, user_id = %user_id, "behavior gate starting");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(config, trace, &user_id))
}
