use chrono::NaiveDate;
use clap::Args;
use taskrank_core::Config;
use tracing::info;

use crate::server::{self, AppState};

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (defaults to `server.host`)
    #[arg(long)]
    pub host: Option<String>,
    /// Port to bind (defaults to `server.port`)
    #[arg(long, short)]
    pub port: Option<u16>,
}

pub fn run(
    args: ServeArgs,
    config: Config,
    fixed_today: Option<NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let state = AppState::from_config(&config, fixed_today);
    let app = server::router(state, config.server.max_body_bytes);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
        info!("Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok::<_, std::io::Error>(())
    })?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
