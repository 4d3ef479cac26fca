//! VRP snapshot schema
//!
//! Only the parts of the snapshot that feed shift timelines are modelled.
//! Timestamps arrive as decimal strings (sometimes empty) or plain integers and
//! are normalised to `Option<i64>` while decoding.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Failure to obtain a snapshot from disk
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub problem: Problem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub description: Description,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Description {
    #[serde(default, alias = "shiftTeams")]
    pub shift_teams: Vec<ShiftTeam>,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default, alias = "restBreaks")]
    pub rest_breaks: Vec<RestBreak>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftTeam {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "availableTimeWindow")]
    pub available_time_window: Option<RawTimeWindow>,
    #[serde(default, alias = "routeHistory")]
    pub route_history: RouteHistory,
}

/// Time window as it appears on the wire; either end may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RawTimeWindow {
    #[serde(default, alias = "startTimestampSec", deserialize_with = "timestamp::deserialize")]
    pub start_timestamp_sec: Option<i64>,
    #[serde(default, alias = "endTimestampSec", deserialize_with = "timestamp::deserialize")]
    pub end_timestamp_sec: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteHistory {
    #[serde(default)]
    pub stops: Vec<RouteStop>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteStop {
    #[serde(default)]
    pub visit: Option<StopVisit>,
    #[serde(default, alias = "restBreak")]
    pub rest_break: Option<StopRestBreak>,
    #[serde(
        default,
        alias = "actualStartTimestampSec",
        deserialize_with = "timestamp::deserialize"
    )]
    pub actual_start_timestamp_sec: Option<i64>,
    #[serde(
        default,
        alias = "actualCompletionTimestampSec",
        deserialize_with = "timestamp::deserialize"
    )]
    pub actual_completion_timestamp_sec: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopVisit {
    #[serde(default, alias = "visitId")]
    pub visit_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopRestBreak {
    #[serde(default, alias = "restBreakId")]
    pub rest_break_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Visit {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "arrivalTimeWindow")]
    pub arrival_time_window: Option<RawTimeWindow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestBreak {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "durationSec", deserialize_with = "timestamp::deserialize")]
    pub duration_sec: Option<i64>,
    #[serde(default, alias = "startTimestampSec", deserialize_with = "timestamp::deserialize")]
    pub start_timestamp_sec: Option<i64>,
}

impl Snapshot {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read and decode a snapshot file
    pub async fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }
}

/// Lenient integer-seconds decoding: `""` and `null` mean absent.
mod timestamp {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TimestampVisitor)
    }

    struct TimestampVisitor;

    impl<'de> Visitor<'de> for TimestampVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("unix seconds as an integer or decimal string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("timestamp {v} out of range")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid timestamp {v:?}")))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_string_and_integer_timestamps() {
        let json = br#"{
            "problem": {"description": {
                "shift_teams": [{
                    "id": "team-1",
                    "available_time_window": {"start_timestamp_sec": "1700000000", "end_timestamp_sec": 1700036000},
                    "route_history": {"stops": [
                        {"visit": {"visit_id": "v1"}, "actual_start_timestamp_sec": "", "actual_completion_timestamp_sec": null}
                    ]}
                }]
            }}
        }"#;

        let snapshot = Snapshot::from_slice(json).unwrap();
        let team = &snapshot.problem.description.shift_teams[0];
        let window = team.available_time_window.unwrap();
        assert_eq!(window.start_timestamp_sec, Some(1_700_000_000));
        assert_eq!(window.end_timestamp_sec, Some(1_700_036_000));

        let stop = &team.route_history.stops[0];
        assert_eq!(stop.visit.as_ref().unwrap().visit_id, "v1");
        assert_eq!(stop.actual_start_timestamp_sec, None);
        assert_eq!(stop.actual_completion_timestamp_sec, None);
    }

    #[test]
    fn test_zero_timestamp_is_present() {
        let json = br#"{"start_timestamp_sec": "0", "end_timestamp_sec": 0}"#;
        let window: RawTimeWindow = serde_json::from_slice(json).unwrap();
        assert_eq!(window.start_timestamp_sec, Some(0));
        assert_eq!(window.end_timestamp_sec, Some(0));
    }

    #[test]
    fn test_camel_case_aliases() {
        let json = br#"{"problem": {"description": {
            "shiftTeams": [{"id": "t", "availableTimeWindow": {"startTimestampSec": "5", "endTimestampSec": "9"}}],
            "restBreaks": [{"id": "b", "durationSec": "1800", "startTimestampSec": "100"}]
        }}}"#;
        let snapshot = Snapshot::from_slice(json).unwrap();
        let description = &snapshot.problem.description;
        assert_eq!(
            description.shift_teams[0].available_time_window.unwrap().end_timestamp_sec,
            Some(9)
        );
        assert_eq!(description.rest_breaks[0].duration_sec, Some(1800));
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let json = br#"{"start_timestamp_sec": "soon"}"#;
        let err = serde_json::from_slice::<RawTimeWindow>(json).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_empty_document_decodes_to_no_teams() {
        let snapshot = Snapshot::from_slice(b"{}").unwrap();
        assert!(snapshot.problem.description.shift_teams.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = Snapshot::from_path(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
