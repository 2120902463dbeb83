use anyhow::Context;
use deepseek_chat::{
    api::{self, AppState},
    cache::ModelSessions,
    chat::{ChatSession, SessionDefaults},
    config::{Backend, Config},
    model::{hub::HubClient, ModelLoader},
    validate,
};
use dotenvy::dotenv;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = <Config as clap::Parser>::parse();

    // logs
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("install prometheus recorder")?;

    let generation = cfg.generation();
    validate::check_config(&generation).context("default generation parameters")?;

    // the hub always handles credentials, whichever backend generates
    let hub = HubClient::new(cfg.hub_url.clone(), cfg.inference_url.clone());
    let loader: Arc<dyn ModelLoader> = match cfg.backend {
        Backend::Hub => Arc::new(hub.clone()),
        Backend::Llama => local_loader(&cfg)?,
    };
    let models = ModelSessions::new(loader, Arc::new(hub));

    let defaults = SessionDefaults {
        model_id: cfg.default_model.clone(),
        credential: cfg.huggingface_api_key.clone(),
        config: generation,
    };
    let session = ChatSession::new(models, defaults, &cfg.save_dir);

    let state = AppState::new(session, cfg.model_menu()).with_metrics(metrics);
    let app = api::routes(state);
    let addr: SocketAddr = cfg.bind_addr.parse()?;

    tracing::info!(%addr, backend = ?cfg.backend, model = %cfg.default_model, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(feature = "llama")]
fn local_loader(cfg: &Config) -> anyhow::Result<Arc<dyn ModelLoader>> {
    use deepseek_chat::model::llama::LlamaLoader;
    Ok(Arc::new(LlamaLoader::new(cfg.n_ctx, cfg.n_batch, cfg.n_gpu_layers)?))
}

#[cfg(not(feature = "llama"))]
fn local_loader(_cfg: &Config) -> anyhow::Result<Arc<dyn ModelLoader>> {
    anyhow::bail!("backend `llama` requires building with `--features llama`")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}
