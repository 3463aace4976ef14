use draw_what_you_see::{
    build_router, catalog::DrawingLibrary, config::Config, storage, AppState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = Config::from_env()?;
    log_configuration(&config);

    if let Err(e) = std::fs::create_dir_all(&config.assets_dir) {
        tracing::warn!("Failed to create assets directory: {}", e);
    } else {
        tracing::info!("Assets directory ready: {}", config.assets_dir.display());
    }

    let library = DrawingLibrary::load_or_init(&config.library_path).await?;
    let storage = storage::open(&config).await?;
    let bind_addr = config.bind_addr();

    let shared_state = Arc::new(AppState::new(library, storage, config));
    let app = build_router(shared_state);

    // ConnectInfo gives the logging middleware the peer address
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Get log level from environment or default to INFO for production
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,draw_what_you_see=trace,hyper=info,tower=info,tower_http=info".to_string()
        } else {
            "info,draw_what_you_see=info,hyper=warn,tower=warn,tower_http=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🎨 Draw What You See starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

fn log_configuration(config: &Config) {
    tracing::info!(
        "Configuration - Bind: {}, Storage: {:?} ({}), Library: {}, SPA bundle: {}",
        config.bind_addr(),
        config.storage_backend,
        config.data_dir.display(),
        config.library_path.display(),
        match &config.public_dir {
            Some(dir) => format!("✅ {}", dir.display()),
            None => "❌".to_string(),
        }
    );
}
