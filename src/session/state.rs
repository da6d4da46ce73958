use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use super::action::ActionKind;
use crate::models::AnalysisResult;

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const LOGIN_PATH: &str = "/login";

const MAX_ACTIVITY: usize = 50;
const MAX_NOTIFICATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ComplianceOfficer,
    Analyst,
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Client-side view of the auth session.
///
/// `is_authenticated` implies `token` is set. `last_activity` only moves
/// forward while authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub is_authenticated: bool,
    pub last_activity: Option<DateTime<Utc>>,
    pub session_timeout: Duration,
    pub user: Option<User>,
    // a refresh call is in flight
    #[serde(default, skip_serializing)]
    pub refreshing: bool,
    pub error: Option<String>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self {
            token: None,
            token_expiry: None,
            is_authenticated: false,
            last_activity: None,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            user: None,
            refreshing: false,
            error: None,
        }
    }
}

impl AuthSession {
    /// Role of the signed-in user, `None` when anonymous.
    pub fn role(&self) -> Option<Role> {
        if !self.is_authenticated {
            return None;
        }
        self.user.as_ref().map(|u| u.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    // stays until dismissed
    pub persistent: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            persistent: false,
            created_at: at,
        }
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    pub notifications: Vec<Notification>,
    pub location: String,
    pub last_denied: Option<ActionKind>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            location: "/".to_string(),
            last_denied: None,
        }
    }
}

impl UiState {
    pub fn on_login_view(&self) -> bool {
        self.location == LOGIN_PATH || self.location.starts_with("/login?")
    }

    pub(crate) fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
        // drop the oldest transient ones first
        while self.notifications.len() > MAX_NOTIFICATIONS {
            match self.notifications.iter().position(|n| !n.persistent) {
                Some(idx) => self.notifications.remove(idx),
                None => self.notifications.remove(0),
            };
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Session,
    Document,
    Analysis,
    Violation,
    Report,
    Guidelines,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: ActivityType,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    // newest first
    pub activity: Vec<ActivityEntry>,
}

impl DashboardState {
    pub(crate) fn record(&mut self, entry: ActivityEntry) {
        self.activity.insert(0, entry);
        self.activity.truncate(MAX_ACTIVITY);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub name: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentsState {
    pub items: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub result: AnalysisResult,
    // rules the reviewer has marked resolved
    pub resolved: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub pending: Vec<String>,
    pub results: BTreeMap<String, DocumentAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    pub auth: AuthSession,
    pub ui: UiState,
    pub dashboard: DashboardState,
    pub documents: DocumentsState,
    pub analysis: AnalysisState,
}
