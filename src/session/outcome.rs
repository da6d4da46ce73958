use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use super::action::Action;
use super::stage::{Effect, Flow, Stage, StageContext};
use super::state::ClientState;

// Scheduled refresh fires this long before the token expires
pub const REFRESH_LEAD: TimeDelta = TimeDelta::minutes(15);

pub const EXPIRED_LOGIN_PATH: &str = "/login?expired=true";

/// When the refresh timer for a token expiring at `expires_at` should fire.
/// `None` when that moment is already past: the token is too short-lived to
/// refresh ahead of time, and the expiry guard refreshes it on the next
/// action inside its own window instead.
pub fn refresh_deadline(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let at = expires_at - REFRESH_LEAD;
    (at > now).then_some(at)
}

/// Reacts to login, refresh and logout outcomes: keeps the outbound HTTP
/// client's bearer token in step with the session and owns the refresh
/// timer.
pub struct OutcomeHandler;

impl OutcomeHandler {
    fn token_acquired(token: &str, expires_at: DateTime<Utc>, cx: &mut StageContext<'_>) {
        cx.token_sink.set_auth_token(token);
        match refresh_deadline(expires_at, cx.now) {
            Some(at) => {
                debug!(%at, %expires_at, "Scheduling token refresh");
                cx.effect(Effect::ScheduleRefresh { at });
            }
            None => debug!(%expires_at, "Token too short-lived for a scheduled refresh"),
        }
    }
}

impl Stage for OutcomeHandler {
    fn name(&self) -> &'static str {
        "outcome_handler"
    }

    // refresh while anonymous, or while one is in flight, is a no-op
    fn before(&self, state: &ClientState, action: &Action, _cx: &mut StageContext<'_>) -> Flow {
        match action {
            Action::RefreshRequest if !state.auth.is_authenticated || state.auth.refreshing => {
                Flow::Swallow
            }
            _ => Flow::Forward,
        }
    }

    fn after(&self, state: &ClientState, action: &Action, cx: &mut StageContext<'_>) {
        match action {
            Action::LoginSuccess {
                token, expires_at, ..
            } => Self::token_acquired(token, *expires_at, cx),
            Action::RefreshSuccess { token, expires_at } if state.auth.is_authenticated => {
                Self::token_acquired(token, *expires_at, cx)
            }
            Action::RefreshRequest => {
                if let Some(token) = state.auth.token.clone() {
                    cx.effect(Effect::RefreshToken { token });
                }
            }
            Action::RefreshTimerFired => {
                // the timer may outlive the session it was set for
                if state.auth.is_authenticated && !state.auth.refreshing {
                    cx.dispatch(Action::RefreshRequest);
                }
            }
            // a failure landing after logout has nothing left to tear down
            Action::RefreshFailure { error } if state.auth.is_authenticated => {
                warn!(%error, "Token refresh failed, logging out");
                cx.dispatch(Action::Logout);
                if !state.ui.on_login_view() {
                    cx.dispatch(Action::Navigate {
                        path: EXPIRED_LOGIN_PATH.to_string(),
                    });
                }
            }
            Action::Logout => {
                cx.token_sink.clear_auth_token();
                cx.effect(Effect::CancelRefresh);
            }
            _ => {}
        }
    }
}
