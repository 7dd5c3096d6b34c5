mod figure;
mod plotly;

use crate::pipeline::{PlotError, Table};

pub use figure::{Annotation, Axis, Figure, Font, Layout, Line, Title, Trace};
pub use plotly::PlotlyEmitter;

/**
 * A measure bound to a table column
 */
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Series {
    pub column: String,
    /// Legend name
    pub name: String,
    pub color: Option<String>,
}

impl Series {
    pub fn new(column: &str, name: &str) -> Self {
        Self {
            column: column.to_string(),
            name: name.to_string(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/**
 * Figure and axis titles, `y2` is only used by the secondary axis of a time series
 */
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Titles {
    pub title: String,
    pub x: Option<Title>,
    pub y: Option<Title>,
    pub y2: Option<Title>,
}

impl Titles {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn x(mut self, title: Title) -> Self {
        self.x = Some(title);
        self
    }

    pub fn y(mut self, title: Title) -> Self {
        self.y = Some(title);
        self
    }

    pub fn y2(mut self, title: Title) -> Self {
        self.y2 = Some(title);
        self
    }
}

/**
 * Turns a result table and its column bindings into a figure.
 * Implementations only read the table, the figure is never inspected by the caller.
 */
pub trait ChartEmitter: Send + Sync {
    /// Two measures over `x`, each on its own y axis
    fn time_series(
        &self,
        table: &Table,
        x: &str,
        primary: &Series,
        secondary: &Series,
        titles: &Titles,
    ) -> Result<Figure, PlotError>;

    /// One measure against another, drawn as markers
    fn scatter(&self, table: &Table, x: &str, y: &Series, titles: &Titles)
        -> Result<Figure, PlotError>;

    /// Several measures over `x` sharing one y axis
    fn lines(
        &self,
        table: &Table,
        x: &str,
        ys: &[Series],
        titles: &Titles,
    ) -> Result<Figure, PlotError>;

    /// Put two figures into one, `top` above `bottom`, their titles become subplot titles
    fn stack(&self, top: Figure, bottom: Figure) -> Figure;
}
