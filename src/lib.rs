mod common;
mod dashboard;
mod loader;
mod pipeline;
mod plots;
mod service;

pub mod chart;

pub use common::{Appliable, Logged};
pub use dashboard::{
    ActualVsPredictedDashboard, Dashboard, DashboardInputs, DashboardLayout, DropdownOption,
    PlotType, QuarterlySpendsDashboard, SpendActivityDashboard, Widget,
};
pub use loader::{load_file, load_table, parse_table};
pub use pipeline::{
    is_select_all, validate_selector, Column, Derivation, Pipeline, PlotError,
    Predicate, Schema, Table, TableQuery, ValidationMode, Value, ValueType,
};
pub use plots::{
    actual_vs_predicted_plot, quarterly_spends_plot, spend_vs_activity_plot,
    ActualVsPredictedQuery, GroupSelection, QuarterlyQuery, SpendActivityQuery,
};
pub use service::{create_dashboard, Args, DashboardKind, DashboardService};
