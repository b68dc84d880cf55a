//! Wire types for the Mission Control JSON endpoints.
//!
//! Every endpoint answers with a `{ "success": bool, ... }` envelope; the
//! remaining keys differ per endpoint and are captured by the payload
//! structs below via `#[serde(flatten)]`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    /// The payload, only when the server reported success.
    pub fn accepted(self) -> Option<T> {
        self.success.then_some(self.payload)
    }
}

// ---------------------------------------------------------------------------
// nio-status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NioState {
    Idle,
    Working,
    Thinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Focused,
    Curious,
    Accomplished,
    Analyzing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    pub session_key: String,
    pub active_sub_agents: u32,
    pub current_model: String,
}

/// Latest activity reported by the Nio agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NioActivity {
    pub id: String,
    pub status: NioState,
    pub message: String,
    #[serde(default)]
    pub task: Option<String>,
    /// ISO-8601.
    pub timestamp: String,
    pub mood: Mood,
    #[serde(default)]
    pub session_info: Option<AgentSession>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NioStatusPayload {
    #[serde(default)]
    pub activity: Option<NioActivity>,
}

// ---------------------------------------------------------------------------
// system-metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Online,
    Degraded,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub status: SystemStatus,
    pub uptime: String,
    pub last_cron: String,
    pub commit_count: u64,
    pub active_skills: u32,
    pub memory_files: u32,
    pub session_cost: String,
    pub model: String,
}

impl Default for SystemMetrics {
    /// Shown before the first successful fetch.
    fn default() -> Self {
        SystemMetrics {
            status: SystemStatus::Online,
            uptime: "calculating...".to_string(),
            last_cron: "checking...".to_string(),
            commit_count: 0,
            active_skills: 42,
            memory_files: 0,
            session_cost: "$0.00".to_string(),
            model: "loading...".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub job_name: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronStatus {
    Ok,
    Late,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronHealth {
    pub job_name: String,
    pub status: CronStatus,
    #[serde(default)]
    pub last_run: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetricsPayload {
    #[serde(default)]
    pub metrics: Option<SystemMetrics>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub cron_health: Vec<CronHealth>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// openclaw-status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub key: String,
    pub kind: String,
    pub model: String,
    #[serde(default)]
    pub percent_used: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub context_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub updated_at: String,
    pub version: String,
    pub channel: String,
    #[serde(default)]
    pub gateway_mode: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub active_session: Option<ActiveSession>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStatusPayload {
    #[serde(default)]
    pub data: Option<SessionInfo>,
}

// ---------------------------------------------------------------------------
// enhanced-data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryKind {
    Daily,
    LongTerm,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Memory {
    /// Case-insensitive match on title, content, or any tag.
    pub fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.content.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}

/// Search and type filter used by the memories widget.
pub fn filter_memories<'a>(
    memories: &'a [Memory],
    kind: Option<MemoryKind>,
    term: &str,
) -> Vec<&'a Memory> {
    memories
        .iter()
        .filter(|m| kind.map_or(true, |k| m.kind == k))
        .filter(|m| m.matches(term))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub task: String,
    pub time: String,
    /// Usually high, medium, or low; other values pass through.
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnhancedData {
    #[serde(default)]
    pub memories: Vec<Memory>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub calendar: Vec<serde_json::Value>,
    #[serde(default)]
    pub drafts: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnhancedDataPayload {
    #[serde(default)]
    pub data: Option<EnhancedData>,
}

// ---------------------------------------------------------------------------
// ops/pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineRunResult {
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Fixed Mission Control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    NioStatus,
    SystemMetrics,
    SessionStatus,
    EnhancedData,
    Pipeline,
}

impl Endpoint {
    pub const POLLED: [Endpoint; 4] = [
        Endpoint::NioStatus,
        Endpoint::SystemMetrics,
        Endpoint::SessionStatus,
        Endpoint::EnhancedData,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::NioStatus => "/api/nio-status",
            Endpoint::SystemMetrics => "/api/system-metrics",
            Endpoint::SessionStatus => "/api/openclaw-status",
            Endpoint::EnhancedData => "/api/enhanced-data",
            Endpoint::Pipeline => "/api/ops/pipeline",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Pipeline => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    /// Default refresh interval; `None` for user-triggered endpoints.
    pub fn default_interval(&self) -> Option<Duration> {
        match self {
            Endpoint::NioStatus => Some(Duration::from_secs(12 * 60 * 60)),
            Endpoint::SystemMetrics => Some(Duration::from_secs(5 * 60)),
            Endpoint::SessionStatus => Some(Duration::from_secs(5 * 60)),
            Endpoint::EnhancedData => Some(Duration::from_secs(10 * 60)),
            Endpoint::Pipeline => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::NioStatus => "nio-status",
            Endpoint::SystemMetrics => "system-metrics",
            Endpoint::SessionStatus => "openclaw-status",
            Endpoint::EnhancedData => "enhanced-data",
            Endpoint::Pipeline => "ops/pipeline",
        }
    }
}
