use std::collections::BTreeMap;

use serde::Serialize;

/**
 * A Plotly-compatible figure, `serde_json::to_value(&figure)` gives the JSON the plotly.js
 * `Plotly.newPlot(div, figure.data, figure.layout)` call expects.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Title of the figure, empty if unset
    pub fn title(&self) -> &str {
        self.layout
            .title
            .as_ref()
            .map(|t| t.text.as_str())
            .unwrap_or_default()
    }

    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|t| t.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub mode: String,
    pub name: String,
    pub x: Vec<serde_json::Value>,
    pub y: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Line {
    pub color: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    /// `xaxis`, `yaxis2`, ... keyed the way plotly names them
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    pub showlegend: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Title {
    pub fn new<T: ToString>(text: T) -> Self {
        Self {
            text: text.to_string(),
            font: None,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.font = Some(Font { size });
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Font {
    pub size: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
}

/**
 * Subplot title, placed relative to the whole paper
 */
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub xref: String,
    pub yref: String,
    pub xanchor: String,
    pub yanchor: String,
    pub showarrow: bool,
}

impl Annotation {
    pub fn subplot_title(text: &str, y: f64) -> Self {
        Self {
            text: text.to_string(),
            x: 0.5,
            y,
            xref: "paper".to_string(),
            yref: "paper".to_string(),
            xanchor: "center".to_string(),
            yanchor: "bottom".to_string(),
            showarrow: false,
        }
    }
}
