//! Hand-drawn vector widgets: the wind compass and the sun/moon arc.
//!
//! Both generators are pure. They return a [`Drawing`], a small shape list in
//! its own coordinate space that renders to SVG.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YAxis {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Stroke {
    fn new(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Disc {
        center: Point,
        radius: f64,
        fill: String,
        opacity: f64,
        stroke: Option<Stroke>,
    },
    Label {
        at: Point,
        text: String,
        font_size: f64,
        color: String,
        bold: bool,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Point>,
        fill: String,
        stroke: Option<Stroke>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawing {
    pub view_box: ViewBox,
    pub y_axis: YAxis,
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub shapes: Vec<Shape>,
}

impl Drawing {
    fn map_y(&self, y: f64) -> f64 {
        match self.y_axis {
            YAxis::Down => y,
            YAxis::Up => self.view_box.y_max + self.view_box.y_min - y,
        }
    }

    fn points_attr(&self, points: &[Point]) -> String {
        points
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, self.map_y(p.y)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_svg(&self) -> String {
        let vb = self.view_box;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{:.2} {:.2} {:.2} {:.2}">"#,
            self.width,
            self.height,
            vb.x_min,
            vb.y_min,
            vb.x_max - vb.x_min,
            vb.y_max - vb.y_min
        );
        if let Some(title) = &self.title {
            let _ = write!(svg, "<title>{}</title>", escape(title));
        }

        for shape in &self.shapes {
            let _ = match shape {
                Shape::Disc {
                    center,
                    radius,
                    fill,
                    opacity,
                    stroke,
                } => write!(
                    svg,
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="{}"{}/>"#,
                    center.x,
                    self.map_y(center.y),
                    radius,
                    fill,
                    opacity,
                    stroke_attrs(stroke.as_ref())
                ),
                Shape::Label {
                    at,
                    text,
                    font_size,
                    color,
                    bold,
                } => write!(
                    svg,
                    r#"<text x="{:.2}" y="{:.2}" font-size="{}" fill="{}" font-family="Arial, sans-serif" font-weight="{}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
                    at.x,
                    self.map_y(at.y),
                    font_size,
                    color,
                    if *bold { "bold" } else { "normal" },
                    escape(text)
                ),
                Shape::Polyline { points, stroke } => write!(
                    svg,
                    r#"<polyline points="{}" fill="none" stroke-linecap="round" stroke-linejoin="round"{}/>"#,
                    self.points_attr(points),
                    stroke_attrs(Some(stroke))
                ),
                Shape::Polygon {
                    points,
                    fill,
                    stroke,
                } => write!(
                    svg,
                    r#"<polygon points="{}" fill="{}"{}/>"#,
                    self.points_attr(points),
                    fill,
                    stroke_attrs(stroke.as_ref())
                ),
            };
        }

        svg.push_str("</svg>");
        svg
    }

    /// The SVG as a `data:` URI, ready to drop into an `<img src>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/svg+xml;utf8,{}", urlencoding::encode(&self.to_svg()))
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    match stroke {
        Some(stroke) if stroke.width > 0.0 => {
            format!(r#" stroke="{}" stroke-width="{}""#, stroke.color, stroke.width)
        }
        _ => String::new(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// Wind compass. Coordinates are y-down, the dial is centered on (50, 50).

const COMPASS_CENTER: Point = Point { x: 50.0, y: 50.0 };
const COMPASS_RENDER_PX: u32 = 120;
const COMPASS_VIEW: ViewBox = ViewBox {
    x_min: -15.0,
    x_max: 115.0,
    y_min: -15.0,
    y_max: 115.0,
};
const ARROW_LENGTH: f64 = 26.0;
const SHAFT_FACTOR: f64 = 0.96;
const HEAD_LENGTH: f64 = 9.0;
const HEAD_ANGLE_DEG: f64 = 30.0;
const SHADOW_OFFSET: f64 = 1.2;
const LABEL_RADIUS: f64 = 58.5;
const ARROW_COLOR: &str = "#ff4757";
const SHADOW_COLOR: &str = "rgba(0,0,0,0.25)";
const HIGHLIGHT_COLOR: &str = "rgba(255,255,255,0.3)";

/// Radius in view units of a marker that is `size_px` pixels wide on screen.
fn marker_radius(size_px: f64) -> f64 {
    let units_per_px = (COMPASS_VIEW.x_max - COMPASS_VIEW.x_min) / f64::from(COMPASS_RENDER_PX);
    size_px / 2.0 * units_per_px
}

fn polar(center: Point, length: f64, angle: f64) -> Point {
    Point::new(center.x + length * angle.sin(), center.y - length * angle.cos())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrowGeometry {
    /// Bearing the arrow points at, in degrees. The wind blows toward it.
    pub bearing_degrees: f64,
    pub tip: Point,
    pub shaft_end: Point,
    pub head_left: Point,
    pub head_right: Point,
}

/// Arrow for a wind reported in the meteorological "from" convention.
pub fn arrow_geometry(direction_degrees: f64) -> ArrowGeometry {
    let bearing_degrees = (direction_degrees + 180.0).rem_euclid(360.0);
    let angle = bearing_degrees.to_radians();
    let head_angle = HEAD_ANGLE_DEG.to_radians();

    let tip = polar(COMPASS_CENTER, ARROW_LENGTH, angle);
    let head = |a: f64| {
        Point::new(
            tip.x - HEAD_LENGTH * a.sin(),
            tip.y + HEAD_LENGTH * a.cos(),
        )
    };

    ArrowGeometry {
        bearing_degrees,
        tip,
        shaft_end: polar(COMPASS_CENTER, ARROW_LENGTH * SHAFT_FACTOR, angle),
        head_left: head(angle - head_angle),
        head_right: head(angle + head_angle),
    }
}

pub fn wind_compass(speed_kmh: f64, direction_degrees: f64) -> Drawing {
    let arrow = arrow_geometry(direction_degrees);
    // y grows downward, so the shadow falls down and to the right
    let shadow = |p: Point| p.offset(SHADOW_OFFSET, SHADOW_OFFSET);
    let mut shapes = Vec::with_capacity(18);

    shapes.push(Shape::Disc {
        center: COMPASS_CENTER,
        radius: marker_radius(95.0),
        fill: "rgb(255,71,87)".to_string(),
        opacity: 0.08,
        stroke: None,
    });
    shapes.push(Shape::Disc {
        center: COMPASS_CENTER,
        radius: marker_radius(85.0),
        fill: "rgb(255,255,255)".to_string(),
        opacity: 0.08,
        stroke: Some(Stroke::new("rgba(255,255,255,0.25)", 2.0)),
    });

    for (i, label) in ["N", "NO", "O", "SO", "S", "SW", "W", "NW"].iter().enumerate() {
        let cardinal = i % 2 == 0;
        shapes.push(Shape::Label {
            at: polar(COMPASS_CENTER, LABEL_RADIUS, (i as f64 * 45.0).to_radians()),
            text: label.to_string(),
            font_size: if cardinal { 15.0 } else { 11.0 },
            color: if cardinal {
                "rgba(255,255,255,0.9)".to_string()
            } else {
                "rgba(255,255,255,0.6)".to_string()
            },
            bold: cardinal,
        });
    }

    shapes.push(Shape::Polyline {
        points: vec![shadow(COMPASS_CENTER), shadow(arrow.shaft_end)],
        stroke: Stroke::new(SHADOW_COLOR, 3.0),
    });
    shapes.push(Shape::Polyline {
        points: vec![COMPASS_CENTER, arrow.shaft_end],
        stroke: Stroke::new(ARROW_COLOR, 3.0),
    });
    shapes.push(Shape::Polyline {
        points: vec![COMPASS_CENTER, arrow.shaft_end],
        stroke: Stroke::new(HIGHLIGHT_COLOR, 0.5),
    });

    let head = [arrow.tip, arrow.head_left, arrow.head_right];
    shapes.push(Shape::Polygon {
        points: head.iter().copied().map(shadow).collect(),
        fill: SHADOW_COLOR.to_string(),
        stroke: None,
    });
    shapes.push(Shape::Polygon {
        points: head.to_vec(),
        fill: ARROW_COLOR.to_string(),
        stroke: None,
    });
    shapes.push(Shape::Polyline {
        points: vec![arrow.tip, arrow.head_left, arrow.head_right, arrow.tip],
        stroke: Stroke::new(HIGHLIGHT_COLOR, 1.0),
    });

    shapes.push(Shape::Disc {
        center: COMPASS_CENTER,
        radius: marker_radius(12.0),
        fill: "rgb(255,255,255)".to_string(),
        opacity: 0.3,
        stroke: None,
    });
    shapes.push(Shape::Disc {
        center: COMPASS_CENTER,
        radius: marker_radius(8.0),
        fill: "white".to_string(),
        opacity: 1.0,
        stroke: None,
    });

    Drawing {
        view_box: COMPASS_VIEW,
        y_axis: YAxis::Down,
        width: COMPASS_RENDER_PX,
        height: COMPASS_RENDER_PX,
        title: Some(format!(
            "Wind {} km/h aus {}",
            speed_kmh.round_ties_even(),
            crate::catalog::compass_label(direction_degrees)
        )),
        shapes,
    }
}

// Sun/moon arc. Coordinates are y-up on a 140x100 canvas, the arc sits on y = 0.

const ARC_CENTER: Point = Point { x: 70.0, y: 0.0 };
const ARC_RADIUS: f64 = 52.0;
const ARC_WIDTH: u32 = 140;
const ARC_HEIGHT: u32 = 100;
const ARC_SAMPLES: usize = 100;
const ARC_LINE_WIDTH: f64 = 9.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeMark {
    pub time: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaylightArc {
    pub is_night: bool,
    pub progress: f64,
    pub title: &'static str,
    pub duration_text: String,
    pub duration_label: &'static str,
    pub first: TimeMark,
    pub second: TimeMark,
    pub arc_color: &'static str,
    pub drawing: Drawing,
}

fn ratio(part: Duration, whole: Duration) -> f64 {
    let whole = whole.num_milliseconds();
    if whole <= 0 {
        return 0.0;
    }
    part.num_milliseconds() as f64 / whole as f64
}

/// Whether it is night at `now` and how far the current day or night has progressed, in [0, 1].
pub fn daylight_progress(sunrise: DateTime<Tz>, sunset: DateTime<Tz>, now: DateTime<Tz>) -> (bool, f64) {
    let is_night = now < sunrise || now > sunset;
    let day_length = sunset - sunrise;
    let night_length = Duration::hours(24) - day_length;

    let progress = if is_night {
        let night_start = if now > sunset {
            sunset
        } else {
            sunset - Duration::hours(24)
        };
        ratio(now - night_start, night_length)
    } else {
        ratio(now - sunrise, day_length)
    };

    (is_night, progress.clamp(0.0, 1.0))
}

/// "H Std. M Min.", wrapping at whole days.
fn format_span(span: Duration) -> String {
    let seconds = span.num_seconds().rem_euclid(86_400);
    format!("{} Std. {} Min.", seconds / 3600, (seconds % 3600) / 60)
}

fn arc_point(angle: f64) -> Point {
    Point::new(
        ARC_CENTER.x + ARC_RADIUS * angle.cos(),
        ARC_CENTER.y + ARC_RADIUS * angle.sin(),
    )
}

fn arc_points(steps: usize) -> Vec<Point> {
    (0..=steps)
        .map(|i| arc_point(PI * i as f64 / ARC_SAMPLES as f64))
        .collect()
}

pub fn day_night_arc(sunrise: DateTime<Tz>, sunset: DateTime<Tz>, now: DateTime<Tz>) -> DaylightArc {
    let (is_night, progress) = daylight_progress(sunrise, sunset, now);
    let day_length = sunset - sunrise;
    let sunrise_mark = TimeMark {
        time: sunrise.format("%H:%M").to_string(),
        label: "Sonnenaufgang",
    };
    let sunset_mark = TimeMark {
        time: sunset.format("%H:%M").to_string(),
        label: "Sonnenuntergang",
    };

    let (title, duration_text, duration_label, first, second) = if is_night {
        (
            "Mond",
            format_span(Duration::hours(24) - day_length),
            "Nachtdauer",
            sunset_mark,
            sunrise_mark,
        )
    } else {
        ("Sonne", format_span(day_length), "Tageslänge", sunrise_mark, sunset_mark)
    };

    let (arc_color, celestial_color, glow_color) = if is_night {
        ("#64748B", "#CBD5E0", "#94A3B8")
    } else if progress < 0.25 {
        ("#FF8E53", "#FFD700", "#FFA500")
    } else if progress < 0.5 {
        ("#FFB84D", "#FFD700", "#FFA500")
    } else if progress < 0.75 {
        ("#FFA726", "#FFD700", "#FFA500")
    } else {
        ("#C084FC", "#FFD700", "#FFA500")
    };

    let marker = arc_point(PI * progress);
    let steps = (progress * ARC_SAMPLES as f64).floor() as usize;

    let shapes = vec![
        Shape::Polyline {
            points: arc_points(ARC_SAMPLES),
            stroke: Stroke::new("rgba(255,255,255,0.18)", ARC_LINE_WIDTH),
        },
        Shape::Polyline {
            points: arc_points(steps),
            stroke: Stroke::new(arc_color, ARC_LINE_WIDTH),
        },
        Shape::Disc {
            center: marker,
            radius: 21.0,
            fill: glow_color.to_string(),
            opacity: 0.4,
            stroke: None,
        },
        Shape::Disc {
            center: marker,
            radius: 16.0,
            fill: celestial_color.to_string(),
            opacity: 1.0,
            stroke: None,
        },
    ];

    DaylightArc {
        is_night,
        progress,
        title,
        duration_text,
        duration_label,
        first,
        second,
        arc_color,
        drawing: Drawing {
            view_box: ViewBox {
                x_min: 0.0,
                x_max: f64::from(ARC_WIDTH),
                y_min: 0.0,
                y_max: f64::from(ARC_HEIGHT),
            },
            y_axis: YAxis::Up,
            width: ARC_WIDTH,
            height: ARC_HEIGHT,
            title: Some(title.to_string()),
            shapes,
        },
    }
}
