use std::net::SocketAddr;
use std::sync::Arc;

use eyecare_quiz::{
    config::{get_config, init_config},
    routes,
    services::{
        question_bank::QuestionBank,
        session_store::{InMemorySessionStore, JsonFileSessionStore, SessionStore},
    },
    AppState,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("eyecare_quiz=info,tower_http=info")),
        )
        .init();
    init_config()?;
    let config = get_config();

    let bank = match &config.question_bank_path {
        Some(path) => QuestionBank::from_path(path)?,
        None => QuestionBank::bundled()?,
    };
    info!(
        quiz_id = %bank.quiz_id,
        modules = bank.modules.len(),
        questions = bank.questions.len(),
        "Question bank loaded"
    );

    let store: Arc<dyn SessionStore> = match &config.session_store_path {
        Some(path) => {
            info!("Persisting quiz sessions to {}", path);
            Arc::new(JsonFileSessionStore::new(path))
        }
        None => {
            info!("Keeping quiz sessions in memory");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let app_state = AppState::new(config, bank, store);

    let app = routes::router(app_state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
