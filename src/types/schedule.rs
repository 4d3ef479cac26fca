//! Schedule types consumed by the timeline layout engine

use serde::{Deserialize, Serialize};

/// Kind of stop on a shift team's route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Visit,
    Break,
}

impl EntryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            EntryKind::Visit => "visit",
            EntryKind::Break => "break",
        }
    }
}

/// Closed interval of Unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

/// One visit or rest break with its planned window and actual interval.
///
/// Absent timestamps are `None`; zero is a valid epoch and never means "unset".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub kind: EntryKind,
    pub planned: Option<TimeWindow>,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
}

impl ScheduleEntry {
    pub fn visit(id: impl Into<String>) -> Self {
        Self::new(id, EntryKind::Visit)
    }

    pub fn rest_break(id: impl Into<String>) -> Self {
        Self::new(id, EntryKind::Break)
    }

    fn new(id: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            id: id.into(),
            kind,
            planned: None,
            actual_start: None,
            actual_end: None,
        }
    }

    #[cfg(test)]
    pub fn with_planned(mut self, start: i64, end: i64) -> Self {
        self.planned = Some(TimeWindow::new(start, end));
        self
    }

    pub fn with_actual(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.actual_start = start;
        self.actual_end = end;
        self
    }

    /// Actual interval when both ends were recorded.
    pub fn actual(&self) -> Option<TimeWindow> {
        match (self.actual_start, self.actual_end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
            _ => None,
        }
    }
}

/// Time domain of one drawing. `end > start` is checked by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBound {
    pub start: i64,
    pub end: i64,
}

impl ShiftBound {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

/// Everything needed to draw one shift team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSchedule {
    pub team_id: String,
    /// `None` when the snapshot carries no usable available time window.
    pub bound: Option<ShiftBound>,
    pub entries: Vec<ScheduleEntry>,
}
