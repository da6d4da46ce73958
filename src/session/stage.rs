use chrono::{DateTime, Utc};

use super::action::Action;
use super::api::AuthTokenSink;
use super::state::ClientState;

// Whether an action continues down the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Forward,
    Swallow,
}

/// Side effects a stage asks the session runtime to perform. The store
/// only collects them; see [`crate::session::driver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RefreshToken { token: String },
    ScheduleRefresh { at: DateTime<Utc> },
    CancelRefresh,
}

pub struct StageContext<'a> {
    pub now: DateTime<Utc>,
    pub token_sink: &'a dyn AuthTokenSink,
    pub(crate) dispatched: Vec<Action>,
    pub(crate) effects: Vec<Effect>,
}

impl<'a> StageContext<'a> {
    pub fn new(now: DateTime<Utc>, token_sink: &'a dyn AuthTokenSink) -> Self {
        Self {
            now,
            token_sink,
            dispatched: Vec::new(),
            effects: Vec::new(),
        }
    }

    // Derived actions run to completion, in order, once the stage returns
    pub fn dispatch(&mut self, action: Action) {
        self.dispatched.push(action);
    }

    pub fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}

/// One link of the middleware chain.
///
/// `before` runs ahead of the reducer and may swallow the action;
/// `after` sees the state the action produced.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn before(&self, _state: &ClientState, _action: &Action, _cx: &mut StageContext<'_>) -> Flow {
        Flow::Forward
    }

    fn after(&self, _state: &ClientState, _action: &Action, _cx: &mut StageContext<'_>) {}
}
