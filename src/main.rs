use std::pin::Pin;

use clap::Parser;
use futures::{Future, TryFutureExt};
use mmx_plots::{Args, DashboardService, PlotError};

use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), PlotError> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Dashboard is starting...");
    let args = Args::parse();

    let svc = DashboardService::new(args).await?;

    let ctrl_c: Pin<Box<dyn Future<Output = Result<(), PlotError>>>> =
        Box::pin(tokio::signal::ctrl_c().map_err(|e| PlotError::Unknown(e.to_string())));
    let task: Pin<Box<dyn Future<Output = Result<(), PlotError>>>> = Box::pin(svc.start());

    futures::future::select(ctrl_c, task).await;
    Ok(())
}
