//! chirpy server binary.
//!
//! Run with:
//!   RUST_LOG=debug cargo run
//!
//! Reads `chirpy.toml` from the working directory if present.
//!
//! Try:
//!   curl http://127.0.0.1:8081/api/healthz
//!   curl -X POST http://127.0.0.1:8081/api/validate_chirp \
//!        -d '{"body":"I had a kerfuffle today"}'
//!   curl http://127.0.0.1:8081/app/
//!   curl http://127.0.0.1:8081/admin/metrics

use tracing_subscriber::{fmt, EnvFilter};

use chirpy::{app, config, Server};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!("chirpy failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> chirpy::Result<()> {
    let cfg = config::load_or_default(config::DEFAULT_CONFIG_FILE)?;
    tracing::info!(
        static_root = %cfg.static_root.display(),
        forbidden_words = cfg.forbidden_words.len(),
        "config loaded"
    );

    let router = app::build_router(app::AppState::new(&cfg));
    Server::bind(cfg.listen).serve(router).await
}
