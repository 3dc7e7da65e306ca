use std::sync::Arc;

use anyhow::Context;
use kote_survey::{
    cli::args_from_env,
    config::Config,
    logging::init_tracing,
    scorer::adapters::HttpClassifierScorer,
    store::{RemoteLogStore, adapters::transport_from_config},
    terminal::TerminalApp,
};
use tokio::io::{BufReader, stdin, stdout};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = args_from_env()?;
    let mut config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let _logging_guard = init_tracing(&config.logging)?;

    let scorer = HttpClassifierScorer::new(&config.scorer).context("failed to build scorer")?;
    let transport = transport_from_config(&config.store).context("failed to build store")?;
    let store = RemoteLogStore::from_config(transport, &config.store)?;
    config.override_flow(args.flow);
    let flow = config.survey.flow;

    tracing::info!(
        target: "kote_survey",
        flow = ?flow,
        scorer_endpoint = %scorer.endpoint(),
        log_path = %store.path(),
        commit_mode = ?store.commit_mode(),
        "app_started"
    );

    let app = TerminalApp::new(Arc::new(scorer), store, config.session_rules());
    let result = app.run(flow, BufReader::new(stdin()), stdout()).await;
    if let Err(err) = &result {
        tracing::error!(target: "kote_survey", error = %err, "app_failed");
    }
    result
}
