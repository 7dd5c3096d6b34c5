use chrono::NaiveDate;
use tracing::debug;

use crate::{
    chart::{ChartEmitter, Figure, PlotlyEmitter, Series, Title, Titles},
    pipeline::{
        is_select_all, validate_selector, Derivation, PlotError, Predicate, Schema, Table,
        TableQuery, Value,
    },
};

pub const SPEND: &str = "Spend";
pub const ACTIVITY: &str = "Activity";
pub const VARIABLE_DESCRIPTION: &str = "variable_description";
pub const ACTIVITY_TYPE: &str = "activity_type";
pub const VARIABLE_ACTIVITY_ROOT: &str = "variable_activity_root";
pub const COST_PER_ACT: &str = "cost_per_act";
pub const YEAR_QTR: &str = "YEAR_QTR";
pub const VALUE: &str = "value";
pub const ACTUALS: &str = "actuals";
pub const PREDS: &str = "preds";

/**
 * Which groups of the group column a plot covers
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupSelection {
    /// The table has no group column
    None,
    /// Every group, summed together
    All { column: String },
    /// Rows of one group only
    One { column: String, value: String },
}

impl GroupSelection {
    /**
     * Resolve the group column and the selected value, the select-all sentinels and an absent
     * value select all groups.
     */
    pub fn new(
        schema: &Schema,
        column: Option<&str>,
        value: Option<&str>,
    ) -> Result<Self, PlotError> {
        let value = value.filter(|v| !is_select_all(v));
        let column = match column {
            Some(c) => c,
            None => {
                return match value {
                    Some(_) => Err(PlotError::InvalidGroupColumn(String::new())),
                    None => Ok(GroupSelection::None),
                }
            }
        };
        if !schema.has_column(column) {
            return Err(PlotError::InvalidGroupColumn(column.to_string()));
        }
        Ok(match value {
            Some(v) => GroupSelection::One {
                column: column.to_string(),
                value: v.to_string(),
            },
            None => GroupSelection::All {
                column: column.to_string(),
            },
        })
    }

    pub fn predicate(&self) -> Option<Predicate> {
        match self {
            GroupSelection::One { column, value } => Predicate::group(column, Some(value)),
            _ => None,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, GroupSelection::All { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpendActivityQuery {
    pub variable_description: String,
    pub activity_type: String,
    /// Inclusive, the whole span of the date column if absent
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub date_col: String,
    pub group_col: Option<String>,
    /// One group of `group_col`. With a group column, an absent value or a select-all
    /// sentinel sums every group per date.
    pub group_value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuarterlyQuery {
    pub variable_description: String,
    pub group_col: Option<String>,
    pub group_value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActualVsPredictedQuery {
    pub date_col: String,
    /// Name of the dependent variable, used as the y axis title
    pub dv_col: String,
    /// `actuals` and `preds` are on log scale
    pub is_log: bool,
    pub group_col: Option<String>,
    pub group_value: Option<String>,
}

/// Keys that keep one row per date and touchpoint when groups are summed
fn spend_group_keys(schema: &Schema, date_col: &str) -> Vec<String> {
    let mut keys = vec![date_col.to_string()];
    if schema.has_column(VARIABLE_ACTIVITY_ROOT) {
        keys.push(VARIABLE_ACTIVITY_ROOT.to_string());
    }
    keys.push(VARIABLE_DESCRIPTION.to_string());
    keys.push(ACTIVITY_TYPE.to_string());
    keys
}

/**
 * The inclusive date bounds to filter on, None if the table has no dates at all
 */
pub(crate) fn resolve_date_range(
    table: &Table,
    date_col: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Option<(Value, Value)>, PlotError> {
    match range {
        Some((start, end)) if start > end => Err(PlotError::InvalidDateRange(
            start.to_string(),
            end.to_string(),
        )),
        Some((start, end)) => {
            // Still fails on unknown date column
            table.schema.get_column(date_col)?;
            Ok(Some((start.into(), end.into())))
        }
        None => table.min_max(date_col),
    }
}

/**
 * Validated, filtered spend and activity rows with the `cost_per_act` column
 */
pub(crate) fn spend_activity_table(
    table: &Table,
    query: &SpendActivityQuery,
) -> Result<Table, PlotError> {
    validate_selector(table, VARIABLE_DESCRIPTION, &query.variable_description)?;
    let variable =
        Predicate::equals_ignore_case(VARIABLE_DESCRIPTION, &query.variable_description);
    // Only activities measured for this variable are valid
    let scoped = TableQuery::new("activity_scope")
        .filter([variable.clone()])
        .run(table)?;
    validate_selector(&scoped, ACTIVITY_TYPE, &query.activity_type)?;

    let group = GroupSelection::new(
        &table.schema,
        query.group_col.as_deref(),
        query.group_value.as_deref(),
    )?;
    let mut predicates = vec![
        variable,
        Predicate::equals_ignore_case(ACTIVITY_TYPE, &query.activity_type),
    ];
    if let Some((start, end)) = resolve_date_range(table, &query.date_col, query.date_range)? {
        predicates.push(Predicate::between(&query.date_col, start, end));
    }
    predicates.extend(group.predicate());

    let mut q = TableQuery::new("spend_vs_activity").filter(predicates);
    if group.is_all() {
        q = q.group_by(spend_group_keys(&table.schema, &query.date_col));
    }
    q.derive(
        COST_PER_ACT,
        Derivation::Ratio {
            numerator: SPEND.to_string(),
            denominator: ACTIVITY.to_string(),
        },
    )
    .run(table)
    .map(|t| {
        debug!(
            "{} rows for '{}' / '{}'",
            t.len(),
            query.variable_description,
            query.activity_type
        );
        t
    })
}

/**
 * Quarterly spend rows of one variable, summed per quarter
 */
pub(crate) fn quarterly_table(table: &Table, query: &QuarterlyQuery) -> Result<Table, PlotError> {
    validate_selector(table, VARIABLE_DESCRIPTION, &query.variable_description)?;
    let group = GroupSelection::new(
        &table.schema,
        query.group_col.as_deref(),
        query.group_value.as_deref(),
    )?;
    let mut predicates = vec![Predicate::equals_ignore_case(
        VARIABLE_DESCRIPTION,
        &query.variable_description,
    )];
    predicates.extend(group.predicate());
    TableQuery::new("quarterly_spends")
        .filter(predicates)
        .group_by([YEAR_QTR])
        .run(table)
}

/**
 * Actuals and predictions on linear scale, summed per date unless one group is selected
 */
pub(crate) fn actual_vs_predicted_table(
    table: &Table,
    query: &ActualVsPredictedQuery,
) -> Result<Table, PlotError> {
    let group = GroupSelection::new(
        &table.schema,
        query.group_col.as_deref(),
        query.group_value.as_deref(),
    )?;
    let mut q = TableQuery::new("actual_vs_predicted");
    if query.is_log {
        q = q
            .derive(ACTUALS, Derivation::Exp(ACTUALS.to_string()))
            .derive(PREDS, Derivation::Exp(PREDS.to_string()));
    }
    q = match group.predicate() {
        Some(p) => q.filter([p]),
        None => q.group_by([query.date_col.as_str()]),
    };
    q.run(table)
}

pub(crate) fn cost_per_activity_figure(
    emitter: &dyn ChartEmitter,
    data: &Table,
    date_col: &str,
    title: &str,
    name: &str,
) -> Result<Figure, PlotError> {
    emitter.lines(
        data,
        date_col,
        &[Series::new(COST_PER_ACT, name)],
        &Titles::new(title).x(Title::new("Date")),
    )
}

pub(crate) fn quarterly_figure(
    emitter: &dyn ChartEmitter,
    data: &Table,
    title: &str,
) -> Result<Figure, PlotError> {
    emitter.lines(
        data,
        YEAR_QTR,
        &[Series::new(VALUE, VALUE)],
        &Titles::new(title)
            .x(Title::new("Year Quarter"))
            .y(Title::new("Spend")),
    )
}

pub(crate) fn actual_vs_predicted_figure(
    emitter: &dyn ChartEmitter,
    data: &Table,
    date_col: &str,
    dv_col: &str,
) -> Result<Figure, PlotError> {
    emitter.lines(
        data,
        date_col,
        &[
            Series::new(ACTUALS, ACTUALS).with_color("blue"),
            Series::new(PREDS, PREDS).with_color("orange"),
        ],
        &Titles::new("Actuals vs Prediction")
            .x(Title::new("Date"))
            .y(Title::new(dv_col)),
    )
}

/**
 * Spend and activity over time of one variable and activity type, with the cost per activity
 * below it.
 */
pub fn spend_vs_activity_plot(
    table: &Table,
    query: &SpendActivityQuery,
) -> Result<Figure, PlotError> {
    let emitter = PlotlyEmitter;
    let data = spend_activity_table(table, query)?;
    let activity = &query.activity_type;
    let top = emitter.time_series(
        &data,
        &query.date_col,
        &Series::new(SPEND, "Spends"),
        &Series::new(ACTIVITY, &format!("Activity ({})", activity)),
        &Titles::new(&format!(
            "Spends vs. Activity ---> {}",
            query.variable_description
        ))
        .x(Title::new("Date"))
        .y(Title::new("<b>Spends</b>").with_size(12))
        .y2(Title::new(format!("<b>Activity ({})</b>", activity)).with_size(10)),
    )?;
    let bottom = cost_per_activity_figure(
        &emitter,
        &data,
        &query.date_col,
        &format!(" Cost per Activity for {} ", activity),
        "Cost_Per_Activity",
    )?;
    Ok(emitter.stack(top, bottom))
}

/**
 * Spend of one variable per quarter
 */
pub fn quarterly_spends_plot(table: &Table, query: &QuarterlyQuery) -> Result<Figure, PlotError> {
    let data = quarterly_table(table, query)?;
    quarterly_figure(
        &PlotlyEmitter,
        &data,
        &format!("Quarterly Spends - {}", query.variable_description),
    )
}

/**
 * Model fit, actuals and predictions over time
 */
pub fn actual_vs_predicted_plot(
    table: &Table,
    query: &ActualVsPredictedQuery,
) -> Result<Figure, PlotError> {
    let data = actual_vs_predicted_table(table, query)?;
    actual_vs_predicted_figure(&PlotlyEmitter, &data, &query.date_col, &query.dv_col)
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use crate::pipeline::{Column, ValueType};

    use super::*;

    pub(crate) fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    /// TV/Impressions in two geos, plus a Radio/Clicks row
    pub(crate) fn spend_table() -> Table {
        let schema = Schema::from(vec![
            Column::new("date", ValueType::Date),
            Column::new("geo", ValueType::String),
            Column::new(VARIABLE_DESCRIPTION, ValueType::String),
            Column::new(ACTIVITY_TYPE, ValueType::String),
            Column::new(SPEND, ValueType::Double),
            Column::new(ACTIVITY, ValueType::Double),
        ]);
        let row = |d: u32,
                   geo: &'static str,
                   v: &'static str,
                   a: &'static str,
                   s: f64,
                   act: f64| {
            vec![
                Value::from(date(d)),
                geo.into(),
                v.into(),
                a.into(),
                s.into(),
                act.into(),
            ]
        };
        Table::new(
            schema,
            vec![
                row(1, "north", "TV", "Impressions", 100.0, 10.0),
                row(2, "north", "TV", "Impressions", 0.0, 0.0),
                row(3, "north", "TV", "Impressions", 50.0, 0.0),
                row(1, "south", "TV", "Impressions", 20.0, 10.0),
                row(1, "north", "Radio", "Clicks", 7.0, 7.0),
            ],
        )
    }

    fn spend_query(group_col: Option<&str>, group_value: Option<&str>) -> SpendActivityQuery {
        SpendActivityQuery {
            variable_description: "tv".to_string(),
            activity_type: "impressions".to_string(),
            date_range: None,
            date_col: "date".to_string(),
            group_col: group_col.map(String::from),
            group_value: group_value.map(String::from),
        }
    }

    fn ys(fig: &Figure, name: &str) -> Vec<serde_json::Value> {
        fig.trace(name).unwrap().y.clone()
    }

    #[test]
    fn test_spend_vs_activity_one_group() {
        let fig =
            spend_vs_activity_plot(&spend_table(), &spend_query(Some("geo"), Some("north")))
                .unwrap();
        assert_eq!(ys(&fig, "Spends"), vec![json!(100.0), json!(0.0), json!(50.0)]);
        assert_eq!(
            ys(&fig, "Cost_Per_Activity"),
            vec![json!(10.0), json!(0.0), json!(0.0)]
        );
        assert_eq!(fig.data.len(), 3);
        assert!(fig.trace("Activity (impressions)").is_some());
        assert_eq!(
            fig.layout.annotations[0].text,
            "Spends vs. Activity ---> tv"
        );
        assert_eq!(
            fig.layout.annotations[1].text,
            " Cost per Activity for impressions "
        );
    }

    #[test]
    fn test_spend_vs_activity_all_groups() {
        let fig =
            spend_vs_activity_plot(&spend_table(), &spend_query(Some("geo"), Some("all")))
                .unwrap();
        // north and south summed on 2021-01-01
        assert_eq!(ys(&fig, "Spends"), vec![json!(120.0), json!(0.0), json!(50.0)]);
        assert_eq!(
            ys(&fig, "Cost_Per_Activity"),
            vec![json!(6.0), json!(0.0), json!(0.0)]
        );

        let none = spend_vs_activity_plot(&spend_table(), &spend_query(Some("geo"), None)).unwrap();
        assert_eq!(none, fig);
    }

    #[test]
    fn test_missing_activity_gives_zero_cost() {
        let t = crate::loader::parse_table(
            r#"[
                {"date": "2021-01-01", "geo": "north", "variable_description": "TV",
                 "activity_type": "Impressions", "Spend": 10, "Activity": null},
                {"date": "2021-01-01", "geo": "south", "variable_description": "TV",
                 "activity_type": "Impressions", "Spend": 5, "Activity": null}
            ]"#,
            "date",
        )
        .unwrap();
        for group in ["all", "north"] {
            let data = spend_activity_table(&t, &spend_query(Some("geo"), Some(group))).unwrap();
            assert_eq!(
                data.column_values(COST_PER_ACT).unwrap(),
                vec![Value::from(0f64)]
            );
        }
    }

    #[test]
    fn test_spend_vs_activity_no_group_and_range() {
        let mut query = spend_query(None, None);
        query.date_range = Some((date(2), date(3)));
        let data = spend_activity_table(&spend_table(), &query).unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.schema.has_column("geo"));
        assert_eq!(
            data.column_values(COST_PER_ACT).unwrap(),
            vec![Value::from(0f64), Value::from(0f64)]
        );

        query.date_range = Some((date(3), date(2)));
        assert!(matches!(
            spend_activity_table(&spend_table(), &query),
            Err(PlotError::InvalidDateRange(_, _))
        ));
    }

    #[test]
    fn test_invalid_selectors() {
        let mut query = spend_query(None, None);
        query.variable_description = "Print".to_string();
        match spend_vs_activity_plot(&spend_table(), &query) {
            Err(PlotError::InvalidSelector { value, valid, .. }) => {
                assert_eq!(value, "Print");
                assert_eq!(valid, vec!["TV", "Radio"]);
            }
            r => panic!("unexpected result {:?}", r),
        }

        // Clicks exists, but not for TV
        let mut query = spend_query(None, None);
        query.activity_type = "Clicks".to_string();
        match spend_vs_activity_plot(&spend_table(), &query) {
            Err(PlotError::InvalidSelector { column, valid, .. }) => {
                assert_eq!(column, ACTIVITY_TYPE);
                assert_eq!(valid, vec!["Impressions"]);
            }
            r => panic!("unexpected result {:?}", r),
        }

        assert!(matches!(
            spend_vs_activity_plot(&spend_table(), &spend_query(Some("region"), None)),
            Err(PlotError::InvalidGroupColumn(c)) if c == "region"
        ));
        assert!(matches!(
            spend_vs_activity_plot(&spend_table(), &spend_query(None, Some("north"))),
            Err(PlotError::InvalidGroupColumn(c)) if c.is_empty()
        ));
    }

    fn quarterly_table_fixture() -> Table {
        let schema = Schema::from(vec![
            Column::new(YEAR_QTR, ValueType::String),
            Column::new("geo", ValueType::String),
            Column::new(VARIABLE_DESCRIPTION, ValueType::String),
            Column::new(VALUE, ValueType::Long),
        ]);
        let row = |q: &'static str, g: &'static str, v: &'static str, s: i64| {
            vec![Value::from(q), g.into(), v.into(), s.into()]
        };
        Table::new(
            schema,
            vec![
                row("2021-Q2", "north", "TV", 5),
                row("2021-Q1", "north", "TV", 1),
                row("2021-Q1", "south", "TV", 2),
                row("2021-Q1", "north", "Radio", 100),
            ],
        )
    }

    #[test]
    fn test_quarterly_spends() {
        let t = quarterly_table_fixture();
        let query = QuarterlyQuery {
            variable_description: "TV".to_string(),
            group_col: Some("geo".to_string()),
            group_value: None,
        };
        let fig = quarterly_spends_plot(&t, &query).unwrap();
        assert_eq!(fig.title(), "Quarterly Spends - TV");
        assert_eq!(fig.data[0].x, vec![json!("2021-Q1"), json!("2021-Q2")]);
        assert_eq!(fig.data[0].y, vec![json!(3), json!(5)]);

        let query = QuarterlyQuery {
            group_value: Some("south".to_string()),
            ..query
        };
        let fig = quarterly_spends_plot(&t, &query).unwrap();
        assert_eq!(fig.data[0].y, vec![json!(2)]);

        let query = QuarterlyQuery {
            variable_description: "Search".to_string(),
            group_col: None,
            group_value: None,
        };
        assert!(matches!(
            quarterly_spends_plot(&t, &query),
            Err(PlotError::InvalidSelector { .. })
        ));
    }

    pub(crate) fn prediction_table() -> Table {
        let schema = Schema::from(vec![
            Column::new("date", ValueType::Date),
            Column::new("geo", ValueType::String),
            Column::new(ACTUALS, ValueType::Double),
            Column::new(PREDS, ValueType::Double),
        ]);
        let row = |d: u32, g: &'static str, a: f64, p: f64| {
            vec![Value::from(date(d)), g.into(), a.into(), p.into()]
        };
        Table::new(
            schema,
            vec![
                row(2, "north", 0.0, 0.0),
                row(1, "north", 0.0, 0.0),
                row(1, "south", 0.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_actual_vs_predicted() {
        let query = ActualVsPredictedQuery {
            date_col: "date".to_string(),
            dv_col: "sales".to_string(),
            is_log: true,
            group_col: Some("geo".to_string()),
            group_value: Some("select_all".to_string()),
        };
        let fig = actual_vs_predicted_plot(&prediction_table(), &query).unwrap();
        assert_eq!(fig.title(), "Actuals vs Prediction");
        // exp(0) summed over two geos on 2021-01-01
        assert_eq!(ys(&fig, ACTUALS), vec![json!(2.0), json!(1.0)]);
        assert_eq!(fig.trace(PREDS).unwrap().line.as_ref().unwrap().color, "orange");
        assert_eq!(
            fig.layout.axes["yaxis"].title.as_ref().unwrap().text,
            "sales"
        );

        let query = ActualVsPredictedQuery {
            is_log: false,
            group_value: Some("north".to_string()),
            ..query
        };
        let fig = actual_vs_predicted_plot(&prediction_table(), &query).unwrap();
        assert_eq!(ys(&fig, ACTUALS), vec![json!(0.0), json!(0.0)]);

        let query = ActualVsPredictedQuery {
            group_col: Some("region".to_string()),
            ..query
        };
        assert!(matches!(
            actual_vs_predicted_plot(&prediction_table(), &query),
            Err(PlotError::InvalidGroupColumn(c)) if c == "region"
        ));
    }
}
