//! Schedule data provider
//!
//! Turns a decoded VRP snapshot into one [`ShiftSchedule`] per shift team:
//! visit stops pick up their arrival window from `visits`, break stops derive
//! their planned window from `rest_breaks` (`start .. start + duration`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::snapshot::{RawTimeWindow, RouteStop, ShiftTeam};
use crate::types::{ScheduleEntry, ShiftBound, ShiftSchedule, Snapshot, TimeWindow};

/// Source of a rest break's actual interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakActuals {
    /// Use the recorded start/completion timestamps of the stop.
    #[default]
    Recorded,
    /// Draw the break's planned window as its actual interval.
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown break actuals source {0:?} (expected \"recorded\" or \"planned\")")]
pub struct UnknownBreakActuals(pub String);

impl FromStr for BreakActuals {
    type Err = UnknownBreakActuals;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recorded" => Ok(BreakActuals::Recorded),
            "planned" => Ok(BreakActuals::Planned),
            _ => Err(UnknownBreakActuals(s.to_string())),
        }
    }
}

impl fmt::Display for BreakActuals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BreakActuals::Recorded => "recorded",
            BreakActuals::Planned => "planned",
        })
    }
}

/// Lookup tables over the snapshot's visit and rest break lists
struct PlannedWindows {
    visits: HashMap<String, Option<TimeWindow>>,
    breaks: HashMap<String, Option<TimeWindow>>,
}

impl PlannedWindows {
    fn new(snapshot: &Snapshot) -> Self {
        let description = &snapshot.problem.description;

        let visits = description
            .visits
            .iter()
            .map(|visit| (visit.id.clone(), visit.arrival_time_window.and_then(window)))
            .collect();

        let breaks = description
            .rest_breaks
            .iter()
            .map(|rest_break| {
                let planned = match (rest_break.start_timestamp_sec, rest_break.duration_sec) {
                    (Some(start), Some(duration)) => {
                        Some(TimeWindow::new(start, start.saturating_add(duration)))
                    }
                    _ => None,
                };
                (rest_break.id.clone(), planned)
            })
            .collect();

        Self { visits, breaks }
    }
}

fn window(raw: RawTimeWindow) -> Option<TimeWindow> {
    match (raw.start_timestamp_sec, raw.end_timestamp_sec) {
        (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
        _ => None,
    }
}

/// Build per-team schedules in snapshot order.
pub fn shift_schedules(snapshot: &Snapshot, break_actuals: BreakActuals) -> Vec<ShiftSchedule> {
    let windows = PlannedWindows::new(snapshot);

    snapshot
        .problem
        .description
        .shift_teams
        .iter()
        .map(|team| team_schedule(team, &windows, break_actuals))
        .collect()
}

fn team_schedule(
    team: &ShiftTeam,
    windows: &PlannedWindows,
    break_actuals: BreakActuals,
) -> ShiftSchedule {
    let bound = team
        .available_time_window
        .and_then(window)
        .map(|w| ShiftBound::new(w.start, w.end));

    let entries: Vec<ScheduleEntry> = team
        .route_history
        .stops
        .iter()
        .enumerate()
        .filter_map(|(index, stop)| {
            let entry = stop_entry(stop, windows, break_actuals);
            if entry.is_none() {
                warn!(
                    "Shift team {}: stop #{} is neither a visit nor a rest break, skipping",
                    team.id, index
                );
            }
            entry
        })
        .collect();

    debug!("Shift team {}: {} entries, bound {:?}", team.id, entries.len(), bound);

    ShiftSchedule {
        team_id: team.id.clone(),
        bound,
        entries,
    }
}

fn stop_entry(
    stop: &RouteStop,
    windows: &PlannedWindows,
    break_actuals: BreakActuals,
) -> Option<ScheduleEntry> {
    let actual_start = stop.actual_start_timestamp_sec;
    let actual_end = stop.actual_completion_timestamp_sec;

    if let Some(visit_id) = stop
        .visit
        .as_ref()
        .map(|v| v.visit_id.as_str())
        .filter(|id| !id.is_empty())
    {
        let mut entry = ScheduleEntry::visit(visit_id).with_actual(actual_start, actual_end);
        entry.planned = lookup(&windows.visits, visit_id, "visit");
        return Some(entry);
    }

    if let Some(break_id) = stop
        .rest_break
        .as_ref()
        .map(|b| b.rest_break_id.as_str())
        .filter(|id| !id.is_empty())
    {
        let mut entry = ScheduleEntry::rest_break(break_id).with_actual(actual_start, actual_end);
        entry.planned = lookup(&windows.breaks, break_id, "rest break");
        if let (BreakActuals::Planned, Some(planned)) = (break_actuals, entry.planned) {
            entry.actual_start = Some(planned.start);
            entry.actual_end = Some(planned.end);
        }
        return Some(entry);
    }

    None
}

fn lookup(table: &HashMap<String, Option<TimeWindow>>, id: &str, what: &str) -> Option<TimeWindow> {
    match table.get(id) {
        Some(planned) => *planned,
        None => {
            debug!("No {} record for {}, drawing without planned window", what, id);
            None
        }
    }
}
