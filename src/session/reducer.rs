use chrono::{DateTime, Utc};

use super::action::Action;
use super::state::{AuthSession, ClientState, DocumentAnalysis};

/// Applies one action to the state. Pure apart from the supplied `now`.
pub fn reduce(state: &mut ClientState, action: &Action, now: DateTime<Utc>) {
    match action {
        Action::LoginRequest => {
            state.auth.error = None;
        }
        Action::LoginSuccess {
            token,
            expires_at,
            user,
        } => {
            let same_user = state.auth.user.as_ref().map(|u| &u.id) == Some(&user.id);
            if state.auth.is_authenticated && !same_user {
                state.dashboard = Default::default();
                state.documents = Default::default();
                state.analysis = Default::default();
            }
            state.auth = AuthSession {
                token: Some(token.clone()),
                token_expiry: Some(*expires_at),
                is_authenticated: true,
                last_activity: Some(now),
                session_timeout: state.auth.session_timeout,
                user: Some(user.clone()),
                refreshing: false,
                error: None,
            };
        }
        // a failed re-login leaves a live session alone
        Action::LoginFailure { error } if state.auth.is_authenticated => {
            state.auth.error = Some(error.clone());
        }
        Action::LoginFailure { error } => {
            state.auth = AuthSession {
                session_timeout: state.auth.session_timeout,
                error: Some(error.clone()),
                ..AuthSession::default()
            };
        }
        Action::RefreshRequest => {
            if state.auth.is_authenticated {
                state.auth.refreshing = true;
            }
        }
        Action::RefreshSuccess { token, expires_at } => {
            // a refresh landing after logout must not resurrect the session
            if state.auth.is_authenticated {
                state.auth.token = Some(token.clone());
                state.auth.token_expiry = Some(*expires_at);
                state.auth.refreshing = false;
            }
        }
        Action::RefreshFailure { error } => {
            state.auth.refreshing = false;
            state.auth.error = Some(error.clone());
        }
        Action::RefreshTimerFired => {}
        Action::Logout => {
            state.auth = AuthSession {
                session_timeout: state.auth.session_timeout,
                error: state.auth.error.take(),
                ..AuthSession::default()
            };
            state.dashboard = Default::default();
            state.documents = Default::default();
            state.analysis = Default::default();
        }
        Action::ActivityTouched { at } => {
            if state.auth.is_authenticated {
                let last = state.auth.last_activity.get_or_insert(*at);
                if *at > *last {
                    *last = *at;
                }
            }
        }

        Action::DocumentUploaded { document } => {
            state.documents.items.retain(|d| d.id != document.id);
            state.documents.items.push(document.clone());
        }
        Action::DocumentDeleted { document_id } => {
            state.documents.items.retain(|d| &d.id != document_id);
            state.analysis.results.remove(document_id);
            state.analysis.pending.retain(|id| id != document_id);
        }
        Action::AnalysisRequested { document_id } => {
            if !state.analysis.pending.contains(document_id) {
                state.analysis.pending.push(document_id.clone());
            }
        }
        Action::AnalysisCompleted {
            document_id,
            result,
        } => {
            state.analysis.pending.retain(|id| id != document_id);
            state.analysis.results.insert(
                document_id.clone(),
                DocumentAnalysis {
                    result: result.clone(),
                    resolved: Vec::new(),
                },
            );
        }
        Action::ViolationResolved { document_id, rule } => {
            if let Some(analysis) = state.analysis.results.get_mut(document_id) {
                if !analysis.resolved.contains(rule) {
                    analysis.resolved.push(rule.clone());
                }
            }
        }
        Action::ReportExported { .. } | Action::GuidelinesUpdated { .. } => {}

        Action::Navigate { path } => {
            state.ui.location = path.clone();
        }
        Action::AddNotification(notification) => {
            state.ui.push_notification(notification.clone());
        }
        Action::DismissNotification { id } => {
            state.ui.notifications.retain(|n| n.id != *id);
        }
        Action::ActivityRecorded(entry) => {
            state.dashboard.record(entry.clone());
        }
        Action::UnauthorizedAction { attempted, .. } => {
            state.ui.last_denied = Some(*attempted);
        }
    }
}
