use clap::Parser;
use dashboard::config::Args;
use dashboard::fetch::HttpFetcher;
use dashboard::map::SceneMap;
use dashboard::poll::Poller;
use dashboard::session::Session;
use dashboard::{metrics, rest};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting herd dashboard");

    if let Err(e) = metrics::init_metrics() {
        error!("Failed to register metrics: {}", e);
        std::process::exit(1);
    }

    let poll_config = args.poll_config();
    let session = Session::<SceneMap>::shared(poll_config.evict_stale_markers);

    let poll_handle = match args.api_config() {
        Some(api_config) => {
            info!("Telemetry API: {}", api_config.base_url);
            let fetcher = match HttpFetcher::new(&api_config) {
                Ok(fetcher) => fetcher,
                Err(e) => {
                    error!("Failed to build API client: {}", e);
                    std::process::exit(1);
                }
            };
            let poller = Poller::new(fetcher, session.clone(), poll_config);
            Some(tokio::spawn(poller.run()))
        }
        None => {
            warn!("API_BASE_URL or API_KEY not set, dashboard will not poll");
            None
        }
    };

    let app = rest::create_router(session);

    let listener = tokio::net::TcpListener::bind(&args.http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", args.http_addr, e);
            std::process::exit(1);
        });

    info!("Scene server listening on {}", args.http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    let poll_task = async {
        match poll_handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!("Poll loop task failed: {}", e);
                }
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = poll_task => {
            error!("Poll loop terminated");
        }
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}
