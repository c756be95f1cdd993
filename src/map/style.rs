//! Stroke styles and popup content for track layers.

use chrono::{DateTime, Utc};

use crate::track::{FeatureAttributes, FeatureKind, TrackFeature};

pub const TRACK_COLOR: &str = "#0ea5e9";
pub const TOW_COLOR: &str = "#f59e0b";
pub const START_FILL: &str = "#10b981";
pub const END_FILL: &str = "#ef4444";
pub const MARKER_STROKE: &str = "#fff";

const LINE_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
}

impl LineStyle {
    /// Tows are drawn heavier and in amber; everything else uses the track style.
    pub fn for_kind(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Tow => Self {
                color: TOW_COLOR,
                weight: 4.0,
                opacity: LINE_OPACITY,
            },
            FeatureKind::Track | FeatureKind::Other => Self {
                color: TRACK_COLOR,
                weight: 3.0,
                opacity: LINE_OPACITY,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl MarkerStyle {
    fn endpoint(fill_color: &'static str) -> Self {
        Self {
            radius: 6.0,
            fill_color,
            color: MARKER_STROKE,
            weight: 2.0,
            opacity: 1.0,
            fill_opacity: 0.8,
        }
    }

    pub fn start() -> Self {
        Self::endpoint(START_FILL)
    }

    pub fn end() -> Self {
        Self::endpoint(END_FILL)
    }
}

/// Content shown when a line or marker is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<String>,
}

impl Popup {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn html(&self) -> String {
        let mut out = format!("<div><strong>{}</strong>", escape_html(&self.title));
        for line in &self.lines {
            out.push_str("<br/>");
            out.push_str(&escape_html(line));
        }
        out.push_str("</div>");
        out
    }
}

/// Popup for a feature, `None` for untyped features.
///
/// Zero-valued depths and durations are shown.
pub fn popup_for(feature: &TrackFeature) -> Option<Popup> {
    match &feature.attributes {
        FeatureAttributes::Track(attrs) => {
            let mut popup = Popup::titled("Trip Track");
            if let Some(start) = attrs.start_time {
                popup.lines.push(format!("Start: {}", format_time(start)));
            }
            if let Some(end) = attrs.end_time {
                popup.lines.push(format!("End: {}", format_time(end)));
            }
            if let Some(count) = attrs.points_count {
                popup.lines.push(format!("Points: {}", count));
            }
            Some(popup)
        }
        FeatureAttributes::Tow(attrs) => {
            let label = attrs
                .tow_number
                .map(i64::from)
                .or(attrs.tow_id)
                .map(|n| format!("Tow {}", n))
                .unwrap_or_else(|| "Tow".to_string());
            let mut popup = Popup::titled(label);
            if let Some(name) = attrs.name.as_deref().filter(|n| !n.is_empty()) {
                popup.lines.push(name.to_string());
            }
            if let Some(depth) = attrs.avg_depth_m {
                popup.lines.push(format!("Avg Depth: {:.1}m", depth));
            }
            if let Some(hours) = attrs.duration_hours {
                popup.lines.push(format!("Duration: {:.1}h", hours));
            }
            Some(popup)
        }
        FeatureAttributes::Other { .. } => None,
    }
}

pub fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
