use chrono::TimeDelta;
use tracing::{debug, info};

use super::action::Action;
use super::stage::{Flow, Stage, StageContext};
use super::state::{ClientState, Notification, NotificationKind};

// Tokens closer than this to expiry get refreshed
pub const REFRESH_WINDOW: TimeDelta = TimeDelta::minutes(5);

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session expired due to inactivity. Please sign in again.";

/// Stamps user activity and enforces token expiry and the inactivity
/// timeout before any non-auth action is applied.
///
/// An expired token or an idle session dispatches a logout; the original
/// action is still forwarded. A token inside [`REFRESH_WINDOW`] triggers a
/// refresh without holding the action back.
pub struct ExpiryGuard;

impl Stage for ExpiryGuard {
    fn name(&self) -> &'static str {
        "expiry_guard"
    }

    fn before(&self, state: &ClientState, action: &Action, cx: &mut StageContext<'_>) -> Flow {
        let auth = &state.auth;
        if action.kind().is_auth() || !auth.is_authenticated {
            return Flow::Forward;
        }
        let now = cx.now;

        let until_expiry = auth.token_expiry.map(|expiry| expiry - now);
        if until_expiry.is_some_and(|left| left <= TimeDelta::zero()) {
            info!(action = %action.kind(), "Token expired, logging out");
            cx.dispatch(Action::Logout);
            return Flow::Forward;
        }

        // judged against the previous stamp, before this action refreshes it
        let timeout = TimeDelta::from_std(auth.session_timeout).unwrap_or(TimeDelta::MAX);
        if auth.last_activity.is_some_and(|last| now - last > timeout) {
            info!(timeout = ?auth.session_timeout, "Session idle past timeout, logging out");
            cx.dispatch(Action::Logout);
            cx.dispatch(Action::AddNotification(
                Notification::new(NotificationKind::Warning, SESSION_EXPIRED_MESSAGE, now).persistent(),
            ));
            return Flow::Forward;
        }

        cx.dispatch(Action::ActivityTouched { at: now });

        if until_expiry.is_some_and(|left| left < REFRESH_WINDOW) && !auth.refreshing {
            debug!(left = ?until_expiry, "Token close to expiry, requesting refresh");
            cx.dispatch(Action::RefreshRequest);
        }
        Flow::Forward
    }
}
