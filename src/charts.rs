use crate::catalog::ContrastClass;
use crate::dashboard::ViewMode;
use crate::forecast::types::HourlyRow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

const TRANSPARENT: &str = "rgba(0,0,0,0)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub color: &'static str,
    pub line_width: Option<f64>,
    pub fill: Option<&'static str>,
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTheme {
    pub template: &'static str,
    pub font_color: &'static str,
    pub grid_color: &'static str,
    pub plot_background: &'static str,
    pub paper_background: &'static str,
}

impl ChartTheme {
    pub fn for_contrast(contrast: ContrastClass) -> Self {
        if contrast.is_dark() {
            Self {
                template: "plotly_white",
                font_color: "#1a1a1a",
                grid_color: "rgba(0,0,0,0.25)",
                plot_background: "rgba(255,255,255,0.1)",
                paper_background: TRANSPARENT,
            }
        } else {
            Self {
                template: "plotly_dark",
                font_color: "#ffffff",
                grid_color: "rgba(255,255,255,0.3)",
                plot_background: "rgba(0,0,0,0.2)",
                paper_background: TRANSPARENT,
            }
        }
    }

    fn blank() -> Self {
        Self {
            template: "",
            font_color: "",
            grid_color: "",
            plot_background: TRANSPARENT,
            paper_background: TRANSPARENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: NaiveDateTime,
    pub value: Option<f64>,
}

/// Semantic description of one chart. Rendering is left to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub y_axis_title: String,
    pub kind: ChartKind,
    pub style: SeriesStyle,
    pub points: Vec<ChartPoint>,
    pub axes_visible: bool,
    pub theme: ChartTheme,
}

impl ChartSpec {
    /// Placeholder with no data and hidden axes.
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            y_axis_title: String::new(),
            kind: ChartKind::Line,
            style: SeriesStyle {
                color: TRANSPARENT,
                line_width: None,
                fill: None,
                opacity: None,
            },
            points: Vec::new(),
            axes_visible: false,
            theme: ChartTheme::blank(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// `Keep` tells the client to leave the chart it already shows untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "update", content = "chart", rename_all = "snake_case")]
pub enum ChartUpdate {
    Replace(ChartSpec),
    Keep,
}

impl ChartUpdate {
    pub fn empty() -> Self {
        ChartUpdate::Replace(ChartSpec::empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    pub view_label: &'static str,
    pub temperature: ChartSpec,
    pub precipitation: ChartSpec,
}

fn series(rows: &[&HourlyRow], metric: impl Fn(&HourlyRow) -> Option<f64>) -> Vec<ChartPoint> {
    let points: Vec<ChartPoint> = rows
        .iter()
        .map(|row| ChartPoint {
            time: row.time,
            value: metric(row),
        })
        .collect();

    if points.iter().all(|point| point.value.is_none()) {
        Vec::new()
    } else {
        points
    }
}

fn chart(
    title: String,
    y_axis_title: &str,
    kind: ChartKind,
    style: SeriesStyle,
    points: Vec<ChartPoint>,
    contrast: ContrastClass,
) -> ChartSpec {
    if points.is_empty() {
        return ChartSpec::empty();
    }
    ChartSpec {
        title,
        y_axis_title: y_axis_title.to_string(),
        kind,
        style,
        points,
        axes_visible: true,
        theme: ChartTheme::for_contrast(contrast),
    }
}

/// Temperature and precipitation charts for the hourly rows. `today` is the
/// current date in the dashboard's timezone and only matters for the today view.
pub fn build_charts(
    hourly: &[HourlyRow],
    view: ViewMode,
    contrast: ContrastClass,
    today: NaiveDate,
) -> Charts {
    if hourly.is_empty() {
        return Charts {
            view_label: "Keine Daten",
            temperature: ChartSpec::empty(),
            precipitation: ChartSpec::empty(),
        };
    }

    let rows: Vec<&HourlyRow> = match view {
        ViewMode::Today => hourly.iter().filter(|row| row.time.date() == today).collect(),
        ViewMode::SevenDays => hourly.iter().collect(),
    };
    let view_label = view.label();

    let temperature = chart(
        format!("Temperaturverlauf - {}", view_label),
        "Temperatur (°C)",
        ChartKind::Line,
        SeriesStyle {
            color: "#ff6b6b",
            line_width: Some(5.0),
            fill: Some("rgba(255,107,107,0.15)"),
            opacity: None,
        },
        series(&rows, |row| row.temperature),
        contrast,
    );

    let precipitation = chart(
        format!("Niederschlag - {}", view_label),
        "Niederschlag (mm)",
        ChartKind::Bar,
        SeriesStyle {
            color: "#45b7d1",
            line_width: None,
            fill: None,
            opacity: Some(0.85),
        },
        series(&rows, |row| row.precipitation),
        contrast,
    );

    Charts {
        view_label,
        temperature,
        precipitation,
    }
}
