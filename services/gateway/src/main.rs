use anyhow::Result;
use reqwest::Url;
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

mod proxy;
mod routes;
mod settings;
mod supervisor;

use crate::{
    proxy::{ProxyState, Route},
    settings::Settings,
    supervisor::{ServiceSpec, Supervisor},
};

/// Wait for Ctrl-C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

fn proxy_routes(settings: &Settings) -> Result<Vec<Route>> {
    let users = Url::parse(&settings.users_url())?;
    let venues = Url::parse(&settings.venues_url())?;
    let bookings = Url::parse(&settings.bookings_url())?;

    Ok(vec![
        Route { prefix: "/api/users", upstream: users.clone() },
        Route { prefix: "/api/auth", upstream: users },
        Route { prefix: "/api/bookings", upstream: bookings },
        Route { prefix: "/api/venues", upstream: venues.clone() },
        Route { prefix: "/uploads", upstream: venues },
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    common::telemetry::init_tracing("gateway");

    info!("Starting gateway");

    let settings: Settings = common::settings::load(Settings::DEFAULTS)?;

    let supervisor = if settings.spawn_services {
        Supervisor::start(vec![
            ServiceSpec::resolve("users", settings.users_bin.as_deref(), settings.users_port),
            ServiceSpec::resolve("venues", settings.venues_bin.as_deref(), settings.venues_port),
            ServiceSpec::resolve(
                "bookings",
                settings.bookings_bin.as_deref(),
                settings.bookings_port,
            ),
        ])
    } else {
        info!("Not spawning backend services");
        Supervisor::start(Vec::new())
    };

    let state = ProxyState {
        client: reqwest::Client::new(),
        routes: Arc::new(proxy_routes(&settings)?),
        max_body_bytes: settings.max_body_bytes,
    };

    let frontend_dir = PathBuf::from(&settings.frontend_dir);
    info!("Serving frontend from {:?}", frontend_dir);

    let app = routes::create_router(state, &frontend_dir);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Stopping backend services");
    supervisor.shutdown().await;

    served?;
    Ok(())
}
