use std::{collections::HashMap, sync::Arc, time::Instant};

use clap::{Parser, ValueEnum};
use poem::{
    error::InternalServerError,
    get, handler,
    listener::TcpListener,
    middleware::{Cors, TokioMetrics, Tracing},
    post,
    web::{Data, Json},
    Endpoint, EndpointExt, Route, Server,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    chart::Figure,
    dashboard::{
        ActualVsPredictedDashboard, Dashboard, DashboardInputs, DashboardLayout,
        QuarterlySpendsDashboard, SpendActivityDashboard,
    },
    loader::load_table,
    pipeline::{PlotError, Table},
    Appliable, Logged,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DashboardKind {
    /// Spend and activity of a touchpoint, plus the cost per activity
    #[default]
    SpendActivity,
    /// Spend per quarter
    Quarterly,
    /// Model actuals against predictions
    ActualVsPredicted,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Observation table, a local JSON file or an http(s) URL
    #[arg(short, long, env = "DATA_FILE")]
    pub data: String,

    #[arg(
        short,
        long,
        value_enum,
        default_value_t = DashboardKind::SpendActivity,
        env = "DASHBOARD_KIND"
    )]
    pub kind: DashboardKind,

    #[arg(long, default_value = "date", env = "DATE_COLUMN")]
    pub date_col: String,

    /// Column holding the sub-group, e.g. geography
    #[arg(long, env = "GROUP_COLUMN")]
    pub group_col: Option<String>,

    /// Name of the dependent variable, shown on the actual vs predicted y axis
    #[arg(long, default_value = "dv", env = "DV_COLUMN")]
    pub dv_col: String,

    /// Actuals and predictions are on log scale
    #[arg(long, default_value_t = false, env = "IS_LOG")]
    pub is_log: bool,

    #[arg(long, default_value = "0.0.0.0", env = "LISTENING_ADDRESS")]
    pub address: String,

    #[arg(long, default_value_t = 8050, env = "LISTENING_PORT")]
    pub port: u16,
}

/**
 * Create the dashboard selected by `args.kind` over the table
 */
pub fn create_dashboard(args: &Args, table: Arc<Table>) -> Result<Arc<dyn Dashboard>, PlotError> {
    Ok(match args.kind {
        DashboardKind::SpendActivity => Arc::new(SpendActivityDashboard::new(
            table,
            &args.date_col,
            args.group_col.clone(),
        )?),
        DashboardKind::Quarterly => {
            Arc::new(QuarterlySpendsDashboard::new(table, args.group_col.clone())?)
        }
        DashboardKind::ActualVsPredicted => Arc::new(ActualVsPredictedDashboard::new(
            table,
            &args.date_col,
            args.group_col.clone(),
            &args.dv_col,
            args.is_log,
        )?),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub inputs: DashboardInputs,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub status: String,
    /// Milliseconds spent on the update
    pub time: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub figures: Vec<Figure>,
}

pub struct DashboardService {
    args: Args,
    dashboard: Arc<dyn Dashboard>,
}

impl DashboardService {
    pub async fn new(args: Args) -> Result<Self, PlotError> {
        let table = Arc::new(load_table(&args.data, &args.date_col).await?);
        let dashboard = create_dashboard(&args, table).log()?;
        Ok(Self { args, dashboard })
    }

    pub fn with_dashboard(args: Args, dashboard: Arc<dyn Dashboard>) -> Self {
        Self { args, dashboard }
    }

    pub async fn start(&self) -> Result<(), PlotError> {
        self.start_at(&self.args.address, self.args.port).await
    }

    fn app(&self) -> impl Endpoint {
        let metrics_update = TokioMetrics::new();

        Route::new()
            .at("/version", get(get_version))
            .at("/metrics", metrics_update.exporter())
            .at("/update", post(update).with(metrics_update))
            .at("/healthz", get(health_check))
            .at("/layout", get(get_layout))
            .with(Cors::new())
            .with(Tracing)
            .data(self.dashboard.clone())
    }

    pub async fn start_at(&self, address: &str, port: u16) -> Result<(), PlotError> {
        let app = self.app();

        info!(
            "Dashboard '{}' started, listening on {}:{}",
            self.dashboard.name(),
            address,
            port
        );
        Server::new(TcpListener::bind(format!("{}:{}", address, port)))
            .run(app)
            .await
            .log()
            .map_err(|e| PlotError::Unknown(e.to_string()))
            .then(|_| info!("Exiting..."))
    }
}

#[handler]
fn get_version() -> Json<HashMap<String, String>> {
    let mut version = HashMap::new();
    version.insert(
        "version".to_string(),
        option_env!("CARGO_PKG_VERSION")
            .unwrap_or_default()
            .to_string(),
    );
    Json(version)
}

#[handler]
fn health_check(dashboard: Data<&Arc<dyn Dashboard>>) -> String {
    match dashboard
        .0
        .default_inputs()
        .and_then(|inputs| dashboard.0.update(&inputs))
        .log()
    {
        Ok(_) => "OK".to_string(),
        Err(_) => "ERROR".to_string(),
    }
}

#[handler]
fn get_layout(dashboard: Data<&Arc<dyn Dashboard>>) -> poem::Result<Json<DashboardLayout>> {
    Ok(Json(
        dashboard.0.layout().log().map_err(InternalServerError)?,
    ))
}

#[handler]
#[instrument(level = "debug", skip_all)]
fn update(dashboard: Data<&Arc<dyn Dashboard>>, req: Json<UpdateRequest>) -> Json<UpdateResponse> {
    let now = Instant::now();
    let result = dashboard.0.update(&req.0.inputs).log_warn();
    let time = (now.elapsed().as_micros() as f64) / 1000f64;
    Json(match result {
        Ok(figures) => UpdateResponse {
            status: "OK".to_string(),
            time,
            figures,
        },
        // Bad selections are reported to the caller, the server keeps running
        Err(e) => UpdateResponse {
            status: format!("ERROR: {}", e),
            time,
            figures: vec![],
        },
    })
}
