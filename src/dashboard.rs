use std::{collections::HashMap, str::FromStr, sync::Arc};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    chart::{ChartEmitter, Figure, PlotlyEmitter, Series, Title, Titles},
    pipeline::{parse_date, PlotError, Table, Value, SELECT_ALL_SENTINELS},
    plots::{
        actual_vs_predicted_figure, actual_vs_predicted_table, cost_per_activity_figure,
        quarterly_figure, quarterly_table, spend_activity_table, ActualVsPredictedQuery,
        QuarterlyQuery, SpendActivityQuery, ACTIVITY, ACTIVITY_TYPE, SPEND, VARIABLE_DESCRIPTION,
    },
};

/// Current widget values keyed by widget id, date pickers report `start_date` and `end_date`
pub type DashboardInputs = HashMap<String, serde_json::Value>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Paragraph {
        text: String,
    },
    Dropdown {
        id: String,
        options: Vec<DropdownOption>,
        value: String,
    },
    DatePickerRange {
        id: String,
        min_date_allowed: String,
        max_date_allowed: String,
        start_date: String,
        end_date: String,
    },
    Graph {
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardLayout {
    pub name: String,
    pub widgets: Vec<Widget>,
}

/**
 * An interactive view over a read-only table.
 * `update` is called with the widget values on every change and returns the figures of all
 * graphs, in layout order.
 */
pub trait Dashboard: Send + Sync {
    fn name(&self) -> &str;

    fn layout(&self) -> Result<DashboardLayout, PlotError>;

    fn update(&self, inputs: &DashboardInputs) -> Result<Vec<Figure>, PlotError>;

    /**
     * The initial values of all input widgets
     */
    fn default_inputs(&self) -> Result<DashboardInputs, PlotError> {
        let mut inputs = DashboardInputs::new();
        for widget in self.layout()?.widgets {
            match widget {
                Widget::Dropdown { id, value, .. } => {
                    inputs.insert(id, value.into());
                }
                Widget::DatePickerRange {
                    start_date,
                    end_date,
                    ..
                } => {
                    inputs.insert("start_date".to_string(), start_date.into());
                    inputs.insert("end_date".to_string(), end_date.into());
                }
                _ => {}
            }
        }
        Ok(inputs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotType {
    Scatter,
    TimeSeries,
}

impl PlotType {
    pub fn label(&self) -> &'static str {
        match self {
            PlotType::Scatter => "Scatter Plot",
            PlotType::TimeSeries => "Time Series",
        }
    }
}

impl FromStr for PlotType {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scatter Plot" => Ok(PlotType::Scatter),
            "Time Series" => Ok(PlotType::TimeSeries),
            _ => Err(PlotError::InvalidPlotType(s.to_string())),
        }
    }
}

fn optional_input(inputs: &DashboardInputs, id: &str) -> Result<Option<String>, PlotError> {
    match inputs.get(id).cloned().map(Value::from) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Error(e)) => Err(e),
        Some(v) => Ok(Some(v.to_string())),
    }
}

fn required_input(inputs: &DashboardInputs, id: &str) -> Result<String, PlotError> {
    optional_input(inputs, id)?.ok_or_else(|| PlotError::MissingInput(id.to_string()))
}

fn date_input(inputs: &DashboardInputs, id: &str) -> Result<Option<NaiveDate>, PlotError> {
    optional_input(inputs, id)?
        .map(|s| parse_date(&s))
        .transpose()
}

/// Dropdown over the distinct values of a column, optionally led by a select-all entry
fn dropdown(
    table: &Table,
    id: &str,
    column: &str,
    select_all: Option<(&str, &str)>,
) -> Result<Widget, PlotError> {
    let mut options = vec![];
    if let Some((label, value)) = select_all {
        options.push(DropdownOption {
            label: label.to_string(),
            value: value.to_string(),
        });
    }
    options.extend(table.distinct_values(column)?.into_iter().map(|v| {
        DropdownOption {
            label: v.to_string(),
            value: v.to_string(),
        }
    }));
    let value = options
        .first()
        .map(|o| o.value.clone())
        .ok_or(PlotError::EmptyTable)?;
    Ok(Widget::Dropdown {
        id: id.to_string(),
        options,
        value,
    })
}

fn date_picker(table: &Table, id: &str, date_col: &str) -> Result<Widget, PlotError> {
    let (min, max) = table.min_max(date_col)?.ok_or(PlotError::EmptyTable)?;
    Ok(Widget::DatePickerRange {
        id: id.to_string(),
        min_date_allowed: min.to_string(),
        max_date_allowed: max.to_string(),
        start_date: min.to_string(),
        end_date: max.to_string(),
    })
}

fn graph(id: &str) -> Widget {
    Widget::Graph { id: id.to_string() }
}

fn check_group_col(table: &Table, group_col: &Option<String>) -> Result<(), PlotError> {
    match group_col {
        Some(c) if !table.schema.has_column(c) => Err(PlotError::InvalidGroupColumn(c.clone())),
        _ => Ok(()),
    }
}

/**
 * Spend and activity of one touchpoint, with a cost per activity chart below
 */
pub struct SpendActivityDashboard {
    table: Arc<Table>,
    date_col: String,
    group_col: Option<String>,
    emitter: Box<dyn ChartEmitter>,
}

impl SpendActivityDashboard {
    pub fn new(
        table: Arc<Table>,
        date_col: &str,
        group_col: Option<String>,
    ) -> Result<Self, PlotError> {
        table.schema.get_column(date_col)?;
        check_group_col(&table, &group_col)?;
        Ok(Self {
            table,
            date_col: date_col.to_string(),
            group_col,
            emitter: Box::new(PlotlyEmitter),
        })
    }

    fn date_range(
        &self,
        inputs: &DashboardInputs,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, PlotError> {
        let start = date_input(inputs, "start_date")?;
        let end = date_input(inputs, "end_date")?;
        if let (Some(start), Some(end)) = (start, end) {
            return Ok(Some((start, end)));
        }
        // A half-open picker falls back to the table's span for the missing bound
        Ok(match self.table.min_max(&self.date_col)? {
            Some((min, max)) => Some((
                start.unwrap_or(min.get_date()?),
                end.unwrap_or(max.get_date()?),
            )),
            None => None,
        })
    }
}

impl Dashboard for SpendActivityDashboard {
    fn name(&self) -> &str {
        "Spends vs. Activity"
    }

    fn layout(&self) -> Result<DashboardLayout, PlotError> {
        let mut widgets = vec![
            dropdown(&self.table, "touchpoint", VARIABLE_DESCRIPTION, None)?,
            dropdown(&self.table, "activity", ACTIVITY_TYPE, None)?,
            Widget::Dropdown {
                id: "plot_type".to_string(),
                options: [PlotType::Scatter, PlotType::TimeSeries]
                    .iter()
                    .map(|t| DropdownOption {
                        label: t.label().to_string(),
                        value: t.label().to_string(),
                    })
                    .collect(),
                value: PlotType::TimeSeries.label().to_string(),
            },
        ];
        if let Some(group_col) = &self.group_col {
            widgets.push(dropdown(
                &self.table,
                "geo",
                group_col,
                Some(("Select all", SELECT_ALL_SENTINELS[0])),
            )?);
        }
        widgets.push(date_picker(&self.table, "date_range_picker", &self.date_col)?);
        widgets.push(graph("graph1"));
        widgets.push(graph("graph2"));
        Ok(DashboardLayout {
            name: self.name().to_string(),
            widgets,
        })
    }

    fn update(&self, inputs: &DashboardInputs) -> Result<Vec<Figure>, PlotError> {
        let plot_type = match optional_input(inputs, "plot_type")? {
            Some(t) => t.parse()?,
            None => PlotType::TimeSeries,
        };
        let query = SpendActivityQuery {
            variable_description: required_input(inputs, "touchpoint")?,
            activity_type: required_input(inputs, "activity")?,
            date_range: self.date_range(inputs)?,
            date_col: self.date_col.clone(),
            group_col: self.group_col.clone(),
            group_value: match self.group_col {
                Some(_) => optional_input(inputs, "geo")?,
                None => None,
            },
        };
        let data = spend_activity_table(&self.table, &query)?;
        let main = match plot_type {
            PlotType::TimeSeries => self.emitter.time_series(
                &data,
                &self.date_col,
                &Series::new(SPEND, "Spends"),
                &Series::new(ACTIVITY, "Activity"),
                &Titles::new("Spends vs. Activity")
                    .x(Title::new("Date"))
                    .y(Title::new("<b>Spends</b>"))
                    .y2(Title::new("<b>Activity</b>")),
            )?,
            PlotType::Scatter => self.emitter.scatter(
                &data,
                ACTIVITY,
                &Series::new(SPEND, SPEND),
                &Titles::new("Scatter plot Spends vs. Activity")
                    .x(Title::new("Activity"))
                    .y(Title::new("Spend")),
            )?,
        };
        let cost = cost_per_activity_figure(
            self.emitter.as_ref(),
            &data,
            &self.date_col,
            " Cost per Activity ",
            "cost_per_act",
        )?;
        Ok(vec![main, cost])
    }
}

/**
 * Spend per quarter of one touchpoint
 */
pub struct QuarterlySpendsDashboard {
    table: Arc<Table>,
    group_col: Option<String>,
    emitter: Box<dyn ChartEmitter>,
}

impl QuarterlySpendsDashboard {
    pub fn new(table: Arc<Table>, group_col: Option<String>) -> Result<Self, PlotError> {
        check_group_col(&table, &group_col)?;
        Ok(Self {
            table,
            group_col,
            emitter: Box::new(PlotlyEmitter),
        })
    }
}

impl Dashboard for QuarterlySpendsDashboard {
    fn name(&self) -> &str {
        "Quarterly Spends"
    }

    fn layout(&self) -> Result<DashboardLayout, PlotError> {
        let mut widgets = vec![dropdown(
            &self.table,
            "touchpoint",
            VARIABLE_DESCRIPTION,
            None,
        )?];
        if let Some(group_col) = &self.group_col {
            widgets.push(dropdown(
                &self.table,
                "geo",
                group_col,
                Some(("Select all", SELECT_ALL_SENTINELS[0])),
            )?);
        }
        widgets.push(graph("graph1"));
        Ok(DashboardLayout {
            name: self.name().to_string(),
            widgets,
        })
    }

    fn update(&self, inputs: &DashboardInputs) -> Result<Vec<Figure>, PlotError> {
        let query = QuarterlyQuery {
            variable_description: required_input(inputs, "touchpoint")?,
            group_col: self.group_col.clone(),
            group_value: match self.group_col {
                Some(_) => optional_input(inputs, "geo")?,
                None => None,
            },
        };
        let data = quarterly_table(&self.table, &query)?;
        Ok(vec![quarterly_figure(
            self.emitter.as_ref(),
            &data,
            "Quarterly Spends",
        )?])
    }
}

/**
 * Actuals against model predictions, for all groups or one of them
 */
pub struct ActualVsPredictedDashboard {
    table: Arc<Table>,
    date_col: String,
    group_col: Option<String>,
    dv_col: String,
    is_log: bool,
    emitter: Box<dyn ChartEmitter>,
}

impl ActualVsPredictedDashboard {
    pub fn new(
        table: Arc<Table>,
        date_col: &str,
        group_col: Option<String>,
        dv_col: &str,
        is_log: bool,
    ) -> Result<Self, PlotError> {
        table.schema.get_column(date_col)?;
        check_group_col(&table, &group_col)?;
        Ok(Self {
            table,
            date_col: date_col.to_string(),
            group_col,
            dv_col: dv_col.to_string(),
            is_log,
            emitter: Box::new(PlotlyEmitter),
        })
    }
}

impl Dashboard for ActualVsPredictedDashboard {
    fn name(&self) -> &str {
        "Actuals vs Prediction"
    }

    fn layout(&self) -> Result<DashboardLayout, PlotError> {
        let mut widgets = vec![];
        if let Some(group_col) = &self.group_col {
            widgets.push(Widget::Paragraph {
                text: "Filter Group variable".to_string(),
            });
            widgets.push(dropdown(
                &self.table,
                "dropdown",
                group_col,
                Some(("Select All", SELECT_ALL_SENTINELS[2])),
            )?);
        }
        widgets.push(graph("line-plot"));
        Ok(DashboardLayout {
            name: self.name().to_string(),
            widgets,
        })
    }

    fn update(&self, inputs: &DashboardInputs) -> Result<Vec<Figure>, PlotError> {
        let query = ActualVsPredictedQuery {
            date_col: self.date_col.clone(),
            dv_col: self.dv_col.clone(),
            is_log: self.is_log,
            group_col: self.group_col.clone(),
            group_value: match self.group_col {
                Some(_) => optional_input(inputs, "dropdown")?,
                None => None,
            },
        };
        let data = actual_vs_predicted_table(&self.table, &query)?;
        Ok(vec![actual_vs_predicted_figure(
            self.emitter.as_ref(),
            &data,
            &self.date_col,
            &self.dv_col,
        )?])
    }
}
