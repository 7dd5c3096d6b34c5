use std::collections::BTreeMap;

use tracing::debug;

use crate::pipeline::{PlotError, Table};

use super::{Annotation, Axis, ChartEmitter, Figure, Layout, Line, Series, Title, Titles, Trace};

// Vertical split of a stacked figure, the gap between rows holds the bottom title
const TOP_DOMAIN: [f64; 2] = [0.575, 1.0];
const BOTTOM_DOMAIN: [f64; 2] = [0.0, 0.425];

/**
 * Emits plotly.js figures
 */
#[derive(Clone, Copy, Debug, Default)]
pub struct PlotlyEmitter;

fn column(table: &Table, name: &str) -> Result<Vec<serde_json::Value>, PlotError> {
    Ok(table
        .column_values(name)?
        .into_iter()
        .map(serde_json::Value::from)
        .collect())
}

fn trace(table: &Table, x: &str, series: &Series, mode: &str) -> Result<Trace, PlotError> {
    Ok(Trace {
        trace_type: "scatter".to_string(),
        mode: mode.to_string(),
        name: series.name.clone(),
        x: column(table, x)?,
        y: column(table, &series.column)?,
        xaxis: Some("x".to_string()),
        yaxis: Some("y".to_string()),
        line: series.color.as_ref().map(|c| Line { color: c.clone() }),
    })
}

fn axis(title: &Option<Title>) -> Axis {
    Axis {
        title: title.clone(),
        ..Default::default()
    }
}

fn layout(titles: &Titles) -> Layout {
    let mut axes = BTreeMap::new();
    axes.insert("xaxis".to_string(), axis(&titles.x));
    axes.insert("yaxis".to_string(), axis(&titles.y));
    Layout {
        title: Some(Title::new(&titles.title)),
        axes,
        annotations: vec![],
        showlegend: true,
    }
}

impl ChartEmitter for PlotlyEmitter {
    fn time_series(
        &self,
        table: &Table,
        x: &str,
        primary: &Series,
        secondary: &Series,
        titles: &Titles,
    ) -> Result<Figure, PlotError> {
        let mut secondary_trace = trace(table, x, secondary, "lines")?;
        secondary_trace.yaxis = Some("y2".to_string());
        let mut layout = layout(titles);
        layout.axes.insert(
            "yaxis2".to_string(),
            Axis {
                title: titles.y2.clone(),
                anchor: Some("x".to_string()),
                overlaying: Some("y".to_string()),
                side: Some("right".to_string()),
                domain: None,
            },
        );
        Ok(Figure {
            data: vec![trace(table, x, primary, "lines")?, secondary_trace],
            layout,
        })
    }

    fn scatter(
        &self,
        table: &Table,
        x: &str,
        y: &Series,
        titles: &Titles,
    ) -> Result<Figure, PlotError> {
        Ok(Figure {
            data: vec![trace(table, x, y, "markers")?],
            layout: layout(titles),
        })
    }

    fn lines(
        &self,
        table: &Table,
        x: &str,
        ys: &[Series],
        titles: &Titles,
    ) -> Result<Figure, PlotError> {
        Ok(Figure {
            data: ys
                .iter()
                .map(|s| trace(table, x, s, "lines"))
                .collect::<Result<Vec<_>, _>>()?,
            layout: layout(titles),
        })
    }

    fn stack(&self, top: Figure, bottom: Figure) -> Figure {
        debug!(
            "Stacking '{}' over '{}'",
            top.title(),
            bottom.title()
        );
        let mut annotations = vec![
            Annotation::subplot_title(top.title(), TOP_DOMAIN[1]),
            Annotation::subplot_title(bottom.title(), BOTTOM_DOMAIN[1]),
        ];
        annotations.retain(|a| !a.text.is_empty());

        let mut axes = BTreeMap::new();
        for (name, mut axis) in top.layout.axes.into_iter() {
            match name.as_str() {
                "xaxis" => axis.anchor = Some("y".to_string()),
                _ => {
                    axis.anchor = Some("x".to_string());
                    axis.domain = Some(TOP_DOMAIN);
                }
            }
            axes.insert(name, axis);
        }
        for (name, mut axis) in bottom.layout.axes.into_iter() {
            match name.as_str() {
                "xaxis" => {
                    axis.anchor = Some("y3".to_string());
                    axes.insert("xaxis2".to_string(), axis);
                }
                "yaxis" => {
                    axis.anchor = Some("x2".to_string());
                    axis.domain = Some(BOTTOM_DOMAIN);
                    axes.insert("yaxis3".to_string(), axis);
                }
                // Secondary axes of the bottom figure are not carried over
                _ => {}
            }
        }

        let mut data = top.data;
        data.extend(bottom.data.into_iter().map(|mut t| {
            t.xaxis = Some("x2".to_string());
            t.yaxis = Some("y3".to_string());
            t
        }));
        Figure {
            data,
            layout: Layout {
                title: None,
                axes,
                annotations,
                showlegend: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::pipeline::{Column, Schema, Value, ValueType};

    use super::*;

    fn table() -> Table {
        let d = |day| Value::from(NaiveDate::from_ymd_opt(2021, 1, day).unwrap());
        Table::new(
            Schema::from(vec![
                Column::new("date", ValueType::Date),
                Column::new("Spend", ValueType::Double),
                Column::new("Activity", ValueType::Long),
            ]),
            vec![
                vec![d(1), Value::from(100f64), Value::from(10)],
                vec![d(2), Value::from(0f64), Value::Null],
            ],
        )
    }

    #[test]
    fn test_time_series() {
        let fig = PlotlyEmitter
            .time_series(
                &table(),
                "date",
                &Series::new("Spend", "Spends"),
                &Series::new("Activity", "Activity"),
                &Titles::new("Spends vs. Activity")
                    .x(Title::new("Date"))
                    .y(Title::new("<b>Spends</b>"))
                    .y2(Title::new("<b>Activity</b>")),
            )
            .unwrap();
        assert_eq!(fig.title(), "Spends vs. Activity");
        let activity = fig.trace("Activity").unwrap();
        assert_eq!(activity.yaxis.as_deref(), Some("y2"));
        assert_eq!(activity.y, vec![json!(10), json!(null)]);

        let v = serde_json::to_value(&fig).unwrap();
        assert_eq!(v["data"][0]["x"], json!(["2021-01-01", "2021-01-02"]));
        assert_eq!(v["data"][0]["type"], json!("scatter"));
        assert_eq!(v["layout"]["yaxis2"]["overlaying"], json!("y"));
        assert_eq!(v["layout"]["yaxis2"]["side"], json!("right"));
        assert_eq!(v["layout"]["xaxis"]["title"]["text"], json!("Date"));
    }

    #[test]
    fn test_lines_and_missing_column() {
        let fig = PlotlyEmitter
            .lines(
                &table(),
                "date",
                &[
                    Series::new("Spend", "Spend").with_color("blue"),
                    Series::new("Activity", "Activity").with_color("orange"),
                ],
                &Titles::new("t"),
            )
            .unwrap();
        assert_eq!(fig.data.len(), 2);
        assert_eq!(fig.data[1].line.as_ref().unwrap().color, "orange");

        let r = PlotlyEmitter.scatter(
            &table(),
            "date",
            &Series::new("Cost", "Cost"),
            &Titles::new("t"),
        );
        assert!(matches!(r, Err(PlotError::ColumnNotFound(c)) if c == "Cost"));
    }

    #[test]
    fn test_stack() {
        let t = table();
        let top = PlotlyEmitter
            .time_series(
                &t,
                "date",
                &Series::new("Spend", "Spends"),
                &Series::new("Activity", "Activity"),
                &Titles::new("top").y(Title::new("<b>Spends</b>").with_size(12)),
            )
            .unwrap();
        let bottom = PlotlyEmitter
            .lines(&t, "date", &[Series::new("Spend", "Cost")], &Titles::new("bottom"))
            .unwrap();
        let fig = PlotlyEmitter.stack(top, bottom);

        assert_eq!(fig.data.len(), 3);
        assert_eq!(fig.data[2].xaxis.as_deref(), Some("x2"));
        assert_eq!(fig.data[2].yaxis.as_deref(), Some("y3"));
        assert_eq!(
            fig.layout.axes.keys().cloned().collect::<Vec<_>>(),
            vec!["xaxis", "xaxis2", "yaxis", "yaxis2", "yaxis3"]
        );
        assert_eq!(
            fig.layout.annotations.iter().map(|a| a.text.as_str()).collect::<Vec<_>>(),
            vec!["top", "bottom"]
        );
        let v = serde_json::to_value(&fig).unwrap();
        assert_eq!(v["layout"]["yaxis"]["title"]["font"]["size"], json!(12));
        assert!(v["layout"].get("title").is_none());
    }
}
