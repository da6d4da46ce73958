use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{ActivityEntry, DocumentSummary, Notification, Role, User};
use crate::models::AnalysisResult;

/// Everything that can change client state. Stages inspect these; the
/// reducer applies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    LoginRequest,
    LoginSuccess {
        token: String,
        expires_at: DateTime<Utc>,
        user: User,
    },
    LoginFailure {
        error: String,
    },
    RefreshRequest,
    RefreshSuccess {
        token: String,
        expires_at: DateTime<Utc>,
    },
    RefreshFailure {
        error: String,
    },
    RefreshTimerFired,
    Logout,
    ActivityTouched {
        at: DateTime<Utc>,
    },

    DocumentUploaded {
        document: DocumentSummary,
    },
    DocumentDeleted {
        document_id: String,
    },
    AnalysisRequested {
        document_id: String,
    },
    AnalysisCompleted {
        document_id: String,
        result: AnalysisResult,
    },
    ViolationResolved {
        document_id: String,
        rule: String,
    },
    ReportExported {
        document_id: String,
        format: String,
    },
    GuidelinesUpdated {
        version: Option<String>,
    },

    Navigate {
        path: String,
    },
    AddNotification(Notification),
    DismissNotification {
        id: Uuid,
    },
    ActivityRecorded(ActivityEntry),
    UnauthorizedAction {
        attempted: ActionKind,
        role: Option<Role>,
    },
}

/// Payload-free mirror of [`Action`], used for table lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    LoginRequest,
    LoginSuccess,
    LoginFailure,
    RefreshRequest,
    RefreshSuccess,
    RefreshFailure,
    RefreshTimerFired,
    Logout,
    ActivityTouched,
    DocumentUploaded,
    DocumentDeleted,
    AnalysisRequested,
    AnalysisCompleted,
    ViolationResolved,
    ReportExported,
    GuidelinesUpdated,
    Navigate,
    AddNotification,
    DismissNotification,
    ActivityRecorded,
    UnauthorizedAction,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::LoginRequest => ActionKind::LoginRequest,
            Action::LoginSuccess { .. } => ActionKind::LoginSuccess,
            Action::LoginFailure { .. } => ActionKind::LoginFailure,
            Action::RefreshRequest => ActionKind::RefreshRequest,
            Action::RefreshSuccess { .. } => ActionKind::RefreshSuccess,
            Action::RefreshFailure { .. } => ActionKind::RefreshFailure,
            Action::RefreshTimerFired => ActionKind::RefreshTimerFired,
            Action::Logout => ActionKind::Logout,
            Action::ActivityTouched { .. } => ActionKind::ActivityTouched,
            Action::DocumentUploaded { .. } => ActionKind::DocumentUploaded,
            Action::DocumentDeleted { .. } => ActionKind::DocumentDeleted,
            Action::AnalysisRequested { .. } => ActionKind::AnalysisRequested,
            Action::AnalysisCompleted { .. } => ActionKind::AnalysisCompleted,
            Action::ViolationResolved { .. } => ActionKind::ViolationResolved,
            Action::ReportExported { .. } => ActionKind::ReportExported,
            Action::GuidelinesUpdated { .. } => ActionKind::GuidelinesUpdated,
            Action::Navigate { .. } => ActionKind::Navigate,
            Action::AddNotification(_) => ActionKind::AddNotification,
            Action::DismissNotification { .. } => ActionKind::DismissNotification,
            Action::ActivityRecorded(_) => ActionKind::ActivityRecorded,
            Action::UnauthorizedAction { .. } => ActionKind::UnauthorizedAction,
        }
    }
}

impl ActionKind {
    // Session lifecycle actions; these never count as user activity
    pub fn is_auth(self) -> bool {
        matches!(
            self,
            ActionKind::LoginRequest
                | ActionKind::LoginSuccess
                | ActionKind::LoginFailure
                | ActionKind::RefreshRequest
                | ActionKind::RefreshSuccess
                | ActionKind::RefreshFailure
                | ActionKind::RefreshTimerFired
                | ActionKind::Logout
                | ActionKind::ActivityTouched
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::LoginRequest => "LOGIN_REQUEST",
            ActionKind::LoginSuccess => "LOGIN_SUCCESS",
            ActionKind::LoginFailure => "LOGIN_FAILURE",
            ActionKind::RefreshRequest => "REFRESH_REQUEST",
            ActionKind::RefreshSuccess => "REFRESH_SUCCESS",
            ActionKind::RefreshFailure => "REFRESH_FAILURE",
            ActionKind::RefreshTimerFired => "REFRESH_TIMER_FIRED",
            ActionKind::Logout => "LOGOUT",
            ActionKind::ActivityTouched => "ACTIVITY_TOUCHED",
            ActionKind::DocumentUploaded => "DOCUMENT_UPLOADED",
            ActionKind::DocumentDeleted => "DOCUMENT_DELETED",
            ActionKind::AnalysisRequested => "ANALYSIS_REQUESTED",
            ActionKind::AnalysisCompleted => "ANALYSIS_COMPLETED",
            ActionKind::ViolationResolved => "VIOLATION_RESOLVED",
            ActionKind::ReportExported => "REPORT_EXPORTED",
            ActionKind::GuidelinesUpdated => "GUIDELINES_UPDATED",
            ActionKind::Navigate => "NAVIGATE",
            ActionKind::AddNotification => "ADD_NOTIFICATION",
            ActionKind::DismissNotification => "DISMISS_NOTIFICATION",
            ActionKind::ActivityRecorded => "ACTIVITY_RECORDED",
            ActionKind::UnauthorizedAction => "UNAUTHORIZED_ACTION",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
