use tracing_subscriber::{FmtSubscriber, EnvFilter};

mod error;
mod config;
mod path;
mod sql;
mod db;
mod cache;
mod state;
mod user;
mod storage;
mod tags;
mod permission;
mod sec;
mod search;
mod share;
mod favorites;
mod usergroup;
mod operatelog;
mod stats;
mod jobs;

fn main() {
    use tokio::runtime::Builder;

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .expect("failed to initialize global tracing subscriber");

    let rt = match Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .max_blocking_threads(4)
        .build() {
        Ok(rt) => rt,
        Err(err) => {
            panic!("failed to start tokio runtime. {}", err);
        }
    };

    tracing::event!(
        tracing::Level::INFO,
        "started tokio runtime"
    );

    if let Err(err) = rt.block_on(init()) {
        tracing::error!("{err}");
    }
}

async fn init() -> error::Result<()> {
    let config = config::get_config()?;
    let state = state::Shared::from_config(&config).await?;

    let jobs = jobs::background(state.registry(), state.persist(), &config.settings.jobs)?;

    tracing::info!("server {} started with jobs {:?}", config.settings.id, jobs);

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }

    tracing::info!("shutting down");

    state.registry().shutdown().await;

    Ok(())
}
