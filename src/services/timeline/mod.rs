//! Timeline layout engine
//!
//! Maps one shift team's schedule onto a fixed-size canvas as an ordered list
//! of drawing primitives: frame, hourly axis, one row per stop, optional legend.
//! The engine is pure; turning primitives into markup is done by [`render_svg`].
//!
//! Horizontal positions use a single linear factor
//! `(width - 2 * margin) / (bound.end - bound.start)` pixels per second, kept as
//! `f64` and rounded (half away from zero) only when a primitive is emitted.

mod svg;

pub use svg::render_svg;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

use crate::defaults::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_LEGEND_CANVAS_HEIGHT, DEFAULT_MARGIN,
    DEFAULT_ROW_HEIGHT, DEFAULT_ROW_SPACING, DEFAULT_ZONE,
};
use crate::types::{EntryKind, ScheduleEntry, ShiftBound, TimeWindow};

/// Upper bound on hourly gridlines in one drawing.
pub const MAX_AXIS_TICKS: i64 = 24;

const FIRST_ROW_OFFSET: i64 = 30;
const AXIS_LABEL_OFFSET: i64 = 20;
const ENTRY_LABEL_OFFSET: i64 = 5;
const ACTUAL_LABEL_OFFSET: i64 = 15;
const PLANNED_LABEL_OFFSET: i64 = 30;

const LEGEND_ITEM_WIDTH: i64 = 130;
const LEGEND_SWATCH_WIDTH: i64 = 14;
const LEGEND_SWATCH_HEIGHT: i64 = 10;
const LEGEND_LABEL_GAP: i64 = 6;

const AXIS_LABEL_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("degenerate shift bound: end {end} is not after start {start}")]
    DegenerateBound { start: i64, end: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown label mode {0:?} (expected \"short\" or \"long\")")]
pub struct UnknownLabelMode(pub String);

/// How per-stop time labels are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// `14:05`
    #[default]
    Short,
    /// `2024-03-09 02:05:00 PM MST`
    Long,
}

impl LabelMode {
    pub const fn pattern(self) -> &'static str {
        match self {
            LabelMode::Short => "%H:%M",
            LabelMode::Long => "%Y-%m-%d %I:%M:%S %p %Z",
        }
    }
}

impl FromStr for LabelMode {
    type Err = UnknownLabelMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(LabelMode::Short),
            "long" => Ok(LabelMode::Long),
            _ => Err(UnknownLabelMode(s.to_string())),
        }
    }
}

impl fmt::Display for LabelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelMode::Short => "short",
            LabelMode::Long => "long",
        })
    }
}

/// Canvas geometry and presentation switches for one layout call
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub row_height: u32,
    /// Distance between the tops of consecutive rows.
    pub row_spacing: u32,
    pub labels: LabelMode,
    pub legend: bool,
    /// Draw a faint band behind every row.
    pub row_bands: bool,
    /// Zone used for hour boundaries and every printed time.
    pub zone: Tz,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            margin: DEFAULT_MARGIN,
            row_height: DEFAULT_ROW_HEIGHT,
            row_spacing: DEFAULT_ROW_SPACING,
            labels: LabelMode::Short,
            legend: false,
            row_bands: false,
            zone: DEFAULT_ZONE,
        }
    }
}

impl LayoutConfig {
    /// Taller canvas with the legend switched on
    pub fn with_legend() -> Self {
        Self {
            height: DEFAULT_LEGEND_CANVAS_HEIGHT,
            legend: true,
            ..Self::default()
        }
    }

    pub fn plot_width(&self) -> i64 {
        self.width as i64 - 2 * self.margin as i64
    }

    pub fn plot_height(&self) -> i64 {
        self.height as i64 - 2 * self.margin as i64
    }

    /// Top edge of row `index`. The pitch never drops below the row height,
    /// so `[top, top + row_height)` ranges of different rows are disjoint.
    pub fn row_top(&self, index: usize) -> i64 {
        let pitch = self.row_spacing.max(self.row_height) as i64;
        self.margin as i64 + FIRST_ROW_OFFSET + index as i64 * pitch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// Which timestamp a time label prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMark {
    PlannedStart,
    PlannedEnd,
    ActualStart,
    ActualEnd,
}

impl TimeMark {
    pub const fn is_planned(self) -> bool {
        matches!(self, TimeMark::PlannedStart | TimeMark::PlannedEnd)
    }
}

/// What a legend swatch stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Swatch {
    Fill(EntryKind),
    Window,
}

/// Presentation class of a primitive; renderers map these to concrete paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Background,
    GridLine,
    AxisLabel,
    RowBackground,
    VisitFill,
    BreakFill,
    WindowOutline,
    EntryLabel,
    TimeLabel(TimeMark),
    LegendSwatch(Swatch),
    LegendLabel,
}

impl Style {
    /// Fill used for the actual interval of a stop of `kind`.
    pub const fn fill(kind: EntryKind) -> Style {
        match kind {
            EntryKind::Visit => Style::VisitFill,
            EntryKind::Break => Style::BreakFill,
        }
    }

    #[cfg(test)]
    pub const fn is_legend(self) -> bool {
        matches!(self, Style::LegendSwatch(_) | Style::LegendLabel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawPrimitive {
    Rect {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        style: Style,
    },
    Line {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        style: Style,
    },
    Text {
        x: i64,
        y: i64,
        text: String,
        anchor: Anchor,
        style: Style,
    },
}

impl DrawPrimitive {
    #[cfg(test)]
    pub fn style(&self) -> Style {
        match self {
            DrawPrimitive::Rect { style, .. }
            | DrawPrimitive::Line { style, .. }
            | DrawPrimitive::Text { style, .. } => *style,
        }
    }
}

/// Seconds-to-pixels mapping for one bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    origin: i64,
    left: f64,
    pixels_per_second: f64,
}

impl TimeScale {
    pub fn new(bound: ShiftBound, config: &LayoutConfig) -> Result<Self, LayoutError> {
        if bound.end <= bound.start {
            return Err(LayoutError::DegenerateBound {
                start: bound.start,
                end: bound.end,
            });
        }
        let seconds = bound.end as f64 - bound.start as f64;
        Ok(Self {
            origin: bound.start,
            left: config.margin as f64,
            pixels_per_second: config.plot_width() as f64 / seconds,
        })
    }

    #[cfg(test)]
    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    pub fn x(&self, timestamp: i64) -> i64 {
        let offset = (timestamp as f64 - self.origin as f64) * self.pixels_per_second;
        (self.left + offset).round() as i64
    }

    /// Pixel length of `from..to`; inverted intervals collapse to zero.
    pub fn span(&self, from: i64, to: i64) -> i64 {
        ((to as f64 - from as f64) * self.pixels_per_second)
            .round()
            .max(0.0) as i64
    }

    fn bar(&self, window: TimeWindow) -> (i64, i64) {
        (self.x(window.start), self.span(window.start, window.end))
    }
}

/// Print `timestamp` in `zone` using the label mode's pattern.
pub fn format_timestamp(timestamp: i64, zone: Tz, mode: LabelMode) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&zone).format(mode.pattern()).to_string(),
        None => timestamp.to_string(),
    }
}

/// Hourly tick instants, stepping local wall-clock time from `bound.start`.
///
/// Hours that do not exist locally (spring-forward gap) are skipped and
/// repeated hours resolve to their earliest instant, so grid spacing is uneven
/// across DST changes.
pub fn axis_ticks(bound: ShiftBound, zone: Tz) -> Vec<DateTime<Tz>> {
    let Some(start) = DateTime::from_timestamp(bound.start, 0) else {
        return Vec::new();
    };
    let first = start.with_timezone(&zone);
    let wall_start = first.naive_local();

    let mut ticks = vec![first];
    for step in 1..MAX_AXIS_TICKS {
        let Some(wall) = wall_start.checked_add_signed(Duration::hours(step)) else {
            break;
        };
        let Some(instant) = zone.from_local_datetime(&wall).earliest() else {
            continue;
        };
        if instant.timestamp() > bound.end {
            break;
        }
        if ticks.last().is_some_and(|last| instant <= *last) {
            continue;
        }
        ticks.push(instant);
    }
    ticks
}

/// Lay out one shift team's stops.
///
/// Output order: frame, axis gridlines and labels, row shapes in input order,
/// row labels in input order, legend. Intervals outside the bound are placed
/// as-is without clipping.
pub fn layout(
    entries: &[ScheduleEntry],
    bound: ShiftBound,
    config: &LayoutConfig,
) -> Result<Vec<DrawPrimitive>, LayoutError> {
    let scale = TimeScale::new(bound, config)?;
    let margin = config.margin as i64;
    let height = config.height as i64;

    let mut primitives =
        Vec::with_capacity(1 + 2 * MAX_AXIS_TICKS as usize + entries.len() * 8 + 6);

    primitives.push(DrawPrimitive::Rect {
        x: margin,
        y: margin,
        width: config.plot_width(),
        height: config.plot_height(),
        style: Style::Background,
    });

    for tick in axis_ticks(bound, config.zone) {
        let x = scale.x(tick.timestamp());
        primitives.push(DrawPrimitive::Line {
            x1: x,
            y1: margin,
            x2: x,
            y2: height - margin,
            style: Style::GridLine,
        });
        primitives.push(DrawPrimitive::Text {
            x,
            y: height - margin + AXIS_LABEL_OFFSET,
            text: tick.format(AXIS_LABEL_FORMAT).to_string(),
            anchor: Anchor::Middle,
            style: Style::AxisLabel,
        });
    }

    // All row shapes go down before any row text so labels are never covered
    // by a neighbouring row's bars.
    for (index, entry) in entries.iter().enumerate() {
        place_row_shapes(&mut primitives, entry, config.row_top(index), &scale, config);
    }
    for (index, entry) in entries.iter().enumerate() {
        place_row_labels(&mut primitives, entry, config.row_top(index), &scale, config);
    }

    if config.legend {
        place_legend(&mut primitives, config);
    }

    Ok(primitives)
}

fn place_row_shapes(
    out: &mut Vec<DrawPrimitive>,
    entry: &ScheduleEntry,
    top: i64,
    scale: &TimeScale,
    config: &LayoutConfig,
) {
    let margin = config.margin as i64;
    let row_height = config.row_height as i64;

    if config.row_bands {
        out.push(DrawPrimitive::Rect {
            x: margin,
            y: top,
            width: config.plot_width(),
            height: row_height,
            style: Style::RowBackground,
        });
    }

    if let Some((x, width)) = entry.planned.map(|window| scale.bar(window)) {
        out.push(DrawPrimitive::Rect {
            x,
            y: top,
            width,
            height: row_height,
            style: Style::WindowOutline,
        });
    }

    if let Some((x, width)) = entry.actual().map(|window| scale.bar(window)) {
        out.push(DrawPrimitive::Rect {
            x,
            y: top,
            width,
            height: row_height,
            style: Style::fill(entry.kind),
        });
    }
}

fn place_row_labels(
    out: &mut Vec<DrawPrimitive>,
    entry: &ScheduleEntry,
    top: i64,
    scale: &TimeScale,
    config: &LayoutConfig,
) {
    let margin = config.margin as i64;
    let planned = entry.planned.map(|window| scale.bar(window));
    let actual = entry.actual().map(|window| scale.bar(window));

    let label_x = entry
        .actual_start
        .or(entry.planned.map(|window| window.start))
        .map_or(margin, |timestamp| scale.x(timestamp));
    out.push(DrawPrimitive::Text {
        x: label_x,
        y: top - ENTRY_LABEL_OFFSET,
        text: format!("{} ({})", entry.id, entry.kind.as_str()),
        anchor: Anchor::Start,
        style: Style::EntryLabel,
    });

    let mut time_label = |x: i64, y: i64, timestamp: i64, anchor: Anchor, mark: TimeMark| {
        out.push(DrawPrimitive::Text {
            x,
            y,
            text: format_timestamp(timestamp, config.zone, config.labels),
            anchor,
            style: Style::TimeLabel(mark),
        });
    };

    if let (Some(window), Some((x, width))) = (entry.planned, planned) {
        let y = top + PLANNED_LABEL_OFFSET;
        time_label(x, y, window.start, Anchor::Start, TimeMark::PlannedStart);
        time_label(x + width, y, window.end, Anchor::End, TimeMark::PlannedEnd);
    }

    let y = top + ACTUAL_LABEL_OFFSET;
    if let Some(start) = entry.actual_start {
        time_label(scale.x(start), y, start, Anchor::Start, TimeMark::ActualStart);
    }
    if let Some(end) = entry.actual_end {
        let x = actual.map_or_else(|| scale.x(end), |(x, width)| x + width);
        time_label(x, y, end, Anchor::End, TimeMark::ActualEnd);
    }
}

fn place_legend(out: &mut Vec<DrawPrimitive>, config: &LayoutConfig) {
    let margin = config.margin as i64;
    let baseline = (margin / 2).max(LEGEND_SWATCH_HEIGHT);
    let items = [
        (Swatch::Fill(EntryKind::Visit), "Visit"),
        (Swatch::Fill(EntryKind::Break), "Break"),
        (Swatch::Window, "Arrival window"),
    ];

    for (index, (swatch, label)) in items.into_iter().enumerate() {
        let x = margin + index as i64 * LEGEND_ITEM_WIDTH;
        out.push(DrawPrimitive::Rect {
            x,
            y: baseline - LEGEND_SWATCH_HEIGHT,
            width: LEGEND_SWATCH_WIDTH,
            height: LEGEND_SWATCH_HEIGHT,
            style: Style::LegendSwatch(swatch),
        });
        out.push(DrawPrimitive::Text {
            x: x + LEGEND_SWATCH_WIDTH + LEGEND_LABEL_GAP,
            y: baseline,
            text: label.to_string(),
            anchor: Anchor::Start,
            style: Style::LegendLabel,
        });
    }
}
