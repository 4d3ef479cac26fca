//! Per-team render batch
//!
//! Each shift team is laid out and written on its own task. A team that cannot
//! be drawn is reported in the summary and never stops the others.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::services::timeline::{layout, render_svg, LayoutConfig, LayoutError};
use crate::types::ShiftSchedule;

/// What gets written per team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `timeline_<team>.svg`
    #[default]
    Svg,
    /// `layout_<team>.json`, the raw primitive list
    Json,
}

impl OutputFormat {
    pub fn file_name(self, team_id: &str) -> String {
        self.stem_file_name(&file_stem(team_id))
    }

    fn stem_file_name(self, stem: &str) -> String {
        match self {
            OutputFormat::Svg => format!("timeline_{}.svg", stem),
            OutputFormat::Json => format!("layout_{}.json", stem),
        }
    }
}

/// Why a team produced no file
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("shift team has no available time window")]
    MissingBound,
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode layout: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct SkippedTeam {
    pub team_id: String,
    pub reason: SkipReason,
}

/// Outcome of a batch, in input team order
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<SkippedTeam>,
}

impl BatchSummary {
    /// Teams that failed for reasons other than bad input data.
    pub fn write_failures(&self) -> usize {
        self.skipped
            .iter()
            .filter(|team| matches!(team.reason, SkipReason::Write { .. } | SkipReason::Encode(_)))
            .count()
    }
}

/// Lay out and write every schedule into `output_dir`.
pub async fn render_all(
    schedules: Vec<ShiftSchedule>,
    config: Arc<LayoutConfig>,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<BatchSummary> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let mut taken = HashSet::new();
    let mut tasks = JoinSet::new();
    for (index, schedule) in schedules.into_iter().enumerate() {
        let config = Arc::clone(&config);
        let path = output_dir.join(unique_file_name(format, &schedule.team_id, &mut taken));
        tasks.spawn(async move {
            let outcome = render_team(&schedule, &config, &path, format).await;
            (index, schedule.team_id, path, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.context("render task panicked")?);
    }
    outcomes.sort_by_key(|(index, ..)| *index);

    let mut summary = BatchSummary::default();
    for (_, team_id, path, outcome) in outcomes {
        match outcome {
            Ok(()) => {
                info!("Timeline for shift team {} written to {}", team_id, path.display());
                summary.written.push(path);
            }
            Err(reason) => {
                match &reason {
                    SkipReason::Write { .. } | SkipReason::Encode(_) => {
                        error!("Shift team {} not rendered: {}", team_id, reason)
                    }
                    _ => warn!("Shift team {} skipped: {}", team_id, reason),
                }
                summary.skipped.push(SkippedTeam { team_id, reason });
            }
        }
    }

    Ok(summary)
}

async fn render_team(
    schedule: &ShiftSchedule,
    config: &LayoutConfig,
    path: &Path,
    format: OutputFormat,
) -> Result<(), SkipReason> {
    let bound = schedule.bound.ok_or(SkipReason::MissingBound)?;
    let primitives = layout(&schedule.entries, bound, config)?;
    debug!(
        "Shift team {}: {} primitives for {} entries",
        schedule.team_id,
        primitives.len(),
        schedule.entries.len()
    );

    let body = match format {
        OutputFormat::Svg => render_svg(&primitives, config).into_bytes(),
        OutputFormat::Json => serde_json::to_vec_pretty(&primitives)?,
    };

    tokio::fs::write(path, body)
        .await
        .map_err(|source| SkipReason::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// File name for `team_id` that no earlier team in the batch has claimed.
///
/// Ids that sanitise to the same stem (or repeat outright) get `_2`, `_3`, ...
fn unique_file_name(format: OutputFormat, team_id: &str, taken: &mut HashSet<String>) -> String {
    let stem = file_stem(team_id);
    let mut name = format.stem_file_name(&stem);
    let mut suffix = 1;
    while !taken.insert(name.clone()) {
        suffix += 1;
        name = format.stem_file_name(&format!("{}_{}", stem, suffix));
    }
    if suffix > 1 {
        warn!("Shift team {}: file name already used in this batch, writing {}", team_id, name);
    }
    name
}

/// Team ids become file names; anything outside `[A-Za-z0-9._-]` is replaced.
fn file_stem(team_id: &str) -> String {
    let cleaned: String = team_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScheduleEntry, ShiftBound};

    fn schedule(team_id: &str, bound: Option<ShiftBound>) -> ShiftSchedule {
        ShiftSchedule {
            team_id: team_id.to_string(),
            bound,
            entries: vec![ScheduleEntry::visit("v1")
                .with_planned(0, 1800)
                .with_actual(Some(600), Some(1200))],
        }
    }

    #[test]
    fn test_file_names_are_sanitised() {
        assert_eq!(OutputFormat::Svg.file_name("team-1"), "timeline_team-1.svg");
        assert_eq!(OutputFormat::Svg.file_name("../etc/passwd"), "timeline___etc_passwd.svg");
        assert_eq!(OutputFormat::Json.file_name("a b"), "layout_a_b.json");
        assert_eq!(OutputFormat::Svg.file_name(""), "timeline_unnamed.svg");
    }

    #[tokio::test]
    async fn test_batch_writes_good_teams_and_skips_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let schedules = vec![
            schedule("ok", Some(ShiftBound::new(0, 3600))),
            schedule("no-window", None),
            schedule("flat", Some(ShiftBound::new(3600, 3600))),
        ];

        let summary = render_all(
            schedules,
            Arc::new(LayoutConfig::default()),
            dir.path(),
            OutputFormat::Svg,
        )
        .await
        .unwrap();

        assert_eq!(summary.written, vec![dir.path().join("timeline_ok.svg")]);
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(summary.skipped[0].team_id, "no-window");
        assert!(matches!(summary.skipped[0].reason, SkipReason::MissingBound));
        assert!(matches!(
            summary.skipped[1].reason,
            SkipReason::Layout(LayoutError::DegenerateBound { .. })
        ));
        assert_eq!(summary.write_failures(), 0);

        let svg = std::fs::read_to_string(dir.path().join("timeline_ok.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("v1 (visit)"));
    }

    #[tokio::test]
    async fn test_json_format_dumps_primitives() {
        let dir = tempfile::tempdir().unwrap();
        let summary = render_all(
            vec![schedule("t1", Some(ShiftBound::new(0, 3600)))],
            Arc::new(LayoutConfig::default()),
            dir.path(),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        assert_eq!(summary.written.len(), 1);
        let raw = std::fs::read_to_string(&summary.written[0]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["type"], "rect");
        assert_eq!(first["style"], "background");
    }

    #[tokio::test]
    async fn test_colliding_team_ids_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = schedule("a b", Some(ShiftBound::new(0, 3600)));
        first.entries[0].id = "first".to_string();
        let mut second = schedule("a_b", Some(ShiftBound::new(0, 3600)));
        second.entries[0].id = "second".to_string();
        let mut third = schedule("a_b", Some(ShiftBound::new(0, 3600)));
        third.entries[0].id = "third".to_string();

        let summary = render_all(
            vec![first, second, third],
            Arc::new(LayoutConfig::default()),
            dir.path(),
            OutputFormat::Svg,
        )
        .await
        .unwrap();

        assert_eq!(
            summary.written,
            vec![
                dir.path().join("timeline_a_b.svg"),
                dir.path().join("timeline_a_b_2.svg"),
                dir.path().join("timeline_a_b_3.svg"),
            ]
        );
        assert!(summary.skipped.is_empty());
        for (path, id) in summary.written.iter().zip(["first", "second", "third"]) {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.contains(&format!("{id} (visit)")), "{}", path.display());
        }
    }

    #[tokio::test]
    async fn test_summary_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let schedules: Vec<_> = (0..8)
            .map(|i| schedule(&format!("team-{i}"), Some(ShiftBound::new(0, 3600))))
            .collect();
        let summary = render_all(
            schedules,
            Arc::new(LayoutConfig::default()),
            dir.path(),
            OutputFormat::Svg,
        )
        .await
        .unwrap();

        let expected: Vec<_> = (0..8)
            .map(|i| dir.path().join(format!("timeline_team-{i}.svg")))
            .collect();
        assert_eq!(summary.written, expected);
    }
}
