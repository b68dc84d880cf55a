//! "Today focus" derivations and relative timestamps for the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{EnhancedData, Incident, Severity, SystemMetricsPayload, Todo};

const MAX_FOCUS_TODOS: usize = 3;

/// Inputs to the focus card: top todos plus open incidents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TodayFocus {
    pub todos: Vec<Todo>,
    pub incidents: Vec<Incident>,
}

impl TodayFocus {
    pub fn new(mut todos: Vec<Todo>, incidents: Vec<Incident>) -> Self {
        todos.truncate(MAX_FOCUS_TODOS);
        TodayFocus { todos, incidents }
    }

    /// Build from the two refresh payloads. Missing payloads count as empty.
    pub fn from_payloads(
        enhanced: Option<&EnhancedData>,
        metrics: Option<&SystemMetricsPayload>,
    ) -> Self {
        TodayFocus::new(
            enhanced.map(|e| e.todos.clone()).unwrap_or_default(),
            metrics.map(|m| m.incidents.clone()).unwrap_or_default(),
        )
    }

    fn first_with(&self, severity: Severity) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.severity == severity)
    }

    /// Red incidents first, then yellow.
    pub fn top_blocker(&self) -> String {
        self.first_with(Severity::Red)
            .or_else(|| self.first_with(Severity::Yellow))
            .map(|i| format!("{}: {}", i.job_name, i.message))
            .unwrap_or_else(|| "No active blockers".to_string())
    }

    pub fn next_action(&self) -> String {
        if self.first_with(Severity::Red).is_some() {
            return "Fix red cron incident and force-run failed job".to_string();
        }
        match self.todos.first() {
            Some(todo) => format!("Execute top priority: {}", todo.task),
            None => "Run updater + metrics + validation pipeline".to_string(),
        }
    }
}

/// Compact relative time: `now`, `5m ago`, `3h ago`, `2d ago`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    if minutes == 0 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

/// `time_ago` for an RFC 3339 timestamp; unparseable input is echoed back.
pub fn time_ago_str(timestamp: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(then) => time_ago(then.with_timezone(&Utc), now),
        Err(_) => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn todo(task: &str) -> Todo {
        Todo {
            task: task.to_string(),
            time: "09:00".to_string(),
            priority: "high".to_string(),
        }
    }

    fn incident(job: &str, severity: Severity) -> Incident {
        Incident {
            id: job.to_string(),
            job_name: job.to_string(),
            severity,
            message: "exit 1".to_string(),
        }
    }

    #[test]
    fn keeps_top_three_todos() {
        let focus = TodayFocus::new(
            vec![todo("a"), todo("b"), todo("c"), todo("d")],
            vec![],
        );
        assert_eq!(focus.todos.len(), 3);
        assert_eq!(focus.next_action(), "Execute top priority: a");
        assert_eq!(focus.top_blocker(), "No active blockers");
    }

    #[test]
    fn red_beats_yellow() {
        let focus = TodayFocus::new(
            vec![todo("a")],
            vec![
                incident("digest", Severity::Yellow),
                incident("updater", Severity::Red),
            ],
        );
        assert_eq!(focus.top_blocker(), "updater: exit 1");
        assert_eq!(
            focus.next_action(),
            "Fix red cron incident and force-run failed job"
        );
    }

    #[test]
    fn yellow_only_does_not_override_todos() {
        let focus = TodayFocus::new(vec![todo("ship")], vec![incident("digest", Severity::Yellow)]);
        assert_eq!(focus.top_blocker(), "digest: exit 1");
        assert_eq!(focus.next_action(), "Execute top priority: ship");
    }

    #[test]
    fn empty_inputs_suggest_pipeline() {
        let focus = TodayFocus::from_payloads(None, None);
        assert_eq!(
            focus.next_action(),
            "Run updater + metrics + validation pipeline"
        );
    }

    #[test]
    fn relative_times() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now, now), "now");
        assert_eq!(time_ago(now - chrono::Duration::seconds(59), now), "now");
        assert_eq!(time_ago(now - chrono::Duration::minutes(1), now), "1m ago");
        assert_eq!(time_ago(now - chrono::Duration::minutes(90), now), "1h ago");
        assert_eq!(time_ago(now - chrono::Duration::days(3), now), "3d ago");
        assert_eq!(time_ago(now + chrono::Duration::minutes(5), now), "now");
        assert_eq!(time_ago_str("2026-02-01T11:30:00Z", now), "30m ago");
        assert_eq!(time_ago_str("yesterday", now), "yesterday");
    }
}
