use std::{process::ExitCode, sync::Arc};

use chrono::Utc;
use clap::Parser;
use crewboard_backend::auth::{issue_token, JwtConfig};
use crewboard_backend::{build_app, AppState};
use crewboard_shared::{AddrInfo, UserId};

use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = crewboard_backend::cli::CliOpts::parse();

    let my_filter = match cli.debug {
        true => "crewboard=debug,crewboard_backend=debug,tower_http=debug",
        false => "crewboard=info,crewboard_backend=info,tower_http=info",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| my_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(user) = cli.issue_token {
        let token = JwtConfig::new(cli.jwt_secret.clone(), cli.jwt_expiry_mins)
            .map_err(|err| err.to_string())
            .and_then(|config| {
                issue_token(UserId(user), &config, Utc::now()).map_err(|err| err.to_string())
            });
        return match token {
            Ok(token) => {
                println!("{token}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("Failed to issue token: {}", err);
                ExitCode::FAILURE
            }
        };
    }

    let appstate = match AppState::new(&cli).await {
        Ok(state) => state,
        Err(err) => {
            error!("Failed to initialize application state: {:?}", err);
            return ExitCode::FAILURE;
        }
    };
    let shared_state = Arc::new(RwLock::new(appstate));

    let addrinfo = AddrInfo::from_env();

    let app = build_app(&shared_state);

    let listener = match tokio::net::TcpListener::bind(&addrinfo.as_addr()).await {
        Ok(val) => {
            info!("Listening on {}", addrinfo.as_url());
            val
        }
        Err(err) => {
            error!("Failed to bind to {}: {:?}", addrinfo.as_url(), err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {:?}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
