//! Wire types returned by the test-automation backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a remote execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// `completed` and `failed` are final; nothing moves out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Pending => write!(f, "pending"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Summary row from `GET /executions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionBrief {
    pub execution_id: String,
    pub status: ExecutionStatus,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_tests: u32,
    #[serde(default)]
    pub total_tests: u32,
    #[serde(default)]
    pub failed_tests: u32,
    #[serde(default)]
    pub source: String,
}

/// Full payload from `GET /executions/{id}`: the brief plus per-test results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionDetail {
    #[serde(flatten)]
    pub brief: ExecutionBrief,
    #[serde(default)]
    pub test_passed: bool,
    #[serde(default)]
    pub test_summary: String,
    #[serde(default)]
    pub xml_results: Vec<TestResult>,
}

impl ExecutionDetail {
    pub fn execution_id(&self) -> &str {
        &self.brief.execution_id
    }
}

/// Outcome of a single test scenario inside an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub testsuite_name: String,
    /// Wall-clock duration in seconds.
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub errors_count: u32,
    #[serde(default)]
    pub failures_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_xml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_logs_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner_thoughts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.errors_count == 0 && self.failures_count == 0
    }
}

/// Backend timestamps arrive either as RFC 3339 or as naive ISO-8601
/// (no offset). Naive values are taken to be UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
            }
        }
    }
}
