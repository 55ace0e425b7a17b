use clap::Parser;
use tokio::net::TcpListener;

use snapchef::{
    build_app,
    config::Config,
    llm::LlmClient,
    logging::init_logging,
    models::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Keep guard alive so the file logger flushes correctly
    let _log_guards = init_logging(&config);

    // The generation credential is non-negotiable: refuse to start without it.
    let Some(api_key) = config.llm_api_key.clone().filter(|k| !k.trim().is_empty()) else {
        anyhow::bail!("SNAPCHEF_LLM_API_KEY is not set; refusing to start");
    };

    tracing::info!("=== Configuration ===");
    tracing::info!("Bind address: {}", config.bind);
    tracing::info!("Media directory: {}", config.media_dir.display());
    tracing::info!("Log file: {}", config.log_file.display());
    tracing::info!("LLM API key: {}", mask_key(&api_key));
    tracing::info!("LLM model: {}", config.llm_model);
    tracing::info!("LLM API URL: {}", config.llm_api_url);
    tracing::info!("LLM timeout: {}s", config.llm_timeout_secs);
    tracing::info!("Max image size: {} MB", config.max_image_mb);
    tracing::info!("====================");

    tokio::fs::create_dir_all(&config.media_dir).await.ok();

    let llm = LlmClient::new(
        config.llm_api_url.clone(),
        api_key,
        config.llm_model.clone(),
    );
    let state = AppState::new(config.clone(), llm);

    let app = build_app(state);

    let listener = TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn mask_key(k: &str) -> String {
    if k.len() <= 6 {
        "***".to_string()
    } else {
        format!("***{}", &k[k.len() - 4..])
    }
}
