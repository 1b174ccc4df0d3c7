use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ckd_predictor::{schema, FormController, ModelManager, RuntimeConfig, SharedModel};
use clap::Parser;
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the ONNX classifier
    #[arg(short, long, default_value = ckd_predictor::model_manager::DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Address to serve the form on
    #[arg(short, long, default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Expected SHA-256 of the model file; loading fails on mismatch
    #[arg(long)]
    model_sha256: Option<String>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 1)]
    intra_threads: usize,

    /// Load the model on the first submission instead of at startup
    #[arg(long)]
    lazy: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ckd_predictor::init_logger();
    let args = Args::parse();

    schema::check_consistency().context("Field schema is inconsistent")?;
    info!("Field schema verified ({} features)", schema::FEATURE_COUNT);

    let config = RuntimeConfig {
        intra_threads: args.intra_threads,
        ..RuntimeConfig::default()
    };
    let mut manager = ModelManager::new(&args.model).with_runtime_config(config);
    if let Some(hash) = args.model_sha256 {
        manager = manager.with_expected_sha256(hash);
    }

    let model = if args.lazy {
        info!("Model will be loaded on first submission from {:?}", args.model);
        SharedModel::lazy(manager)
    } else {
        SharedModel::eager(manager)
    };
    if let Some(reason) = model.unavailable_reason() {
        warn!("Serving without a model, predictions are disabled: {}", reason);
    }

    let app = ckd_predictor::server::build_app(FormController::new(Arc::new(model)));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;
    info!("Chronic Kidney Disease Predictor listening on http://{}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
