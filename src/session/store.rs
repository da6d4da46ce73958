use std::sync::Arc;
use tracing::{trace, warn};

use super::action::Action;
use super::api::AuthTokenSink;
use super::guard::ExpiryGuard;
use super::outcome::{OutcomeHandler, refresh_deadline};
use super::permissions::PermissionGate;
use super::persist::PersistedState;
use super::reducer::reduce;
use super::stage::{Effect, Flow, Stage, StageContext};
use super::state::ClientState;
use super::telemetry::ActivityTelemetry;
use crate::clock::Clock;

// Derived actions dispatching further derived actions past this depth
// point at a stage loop
const MAX_DEPTH: usize = 16;

pub fn default_stages() -> Arc<[Box<dyn Stage>]> {
    Arc::new([
        Box::new(ExpiryGuard) as Box<dyn Stage>,
        Box::new(OutcomeHandler),
        Box::new(PermissionGate),
        Box::new(ActivityTelemetry),
    ])
}

/// Client state plus the middleware chain every action passes through.
///
/// `dispatch` is synchronous: derived actions a stage emits are fully
/// processed before the chain moves on, and effects are collected for
/// the runtime to pick up with [`Store::take_effects`].
pub struct Store {
    state: ClientState,
    stages: Arc<[Box<dyn Stage>]>,
    clock: Arc<dyn Clock>,
    token_sink: Arc<dyn AuthTokenSink>,
    effects: Vec<Effect>,
    depth: usize,
}

impl Store {
    pub fn new(clock: Arc<dyn Clock>, token_sink: Arc<dyn AuthTokenSink>) -> Self {
        Self {
            state: ClientState::default(),
            stages: default_stages(),
            clock,
            token_sink,
            effects: Vec::new(),
            depth: 0,
        }
    }

    /// Rebuilds a store from persisted `auth` and `ui` slices. A session
    /// that is still signed in gets its token pushed to the HTTP client
    /// and a refresh scheduled; expiry itself is left to the guard.
    pub fn restore(
        persisted: PersistedState,
        clock: Arc<dyn Clock>,
        token_sink: Arc<dyn AuthTokenSink>,
    ) -> Self {
        let mut store = Self::new(clock, token_sink);
        store.state = persisted.rehydrate();

        let auth = &store.state.auth;
        if let (true, Some(token), Some(expiry)) =
            (auth.is_authenticated, auth.token.as_deref(), auth.token_expiry)
        {
            store.token_sink.set_auth_token(token);
            if let Some(at) = refresh_deadline(expiry, store.clock.now()) {
                store.effects.push(Effect::ScheduleRefresh { at });
            }
        }
        store
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState::from_state(&self.state)
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn dispatch(&mut self, action: Action) {
        if self.depth >= MAX_DEPTH {
            warn!(action = %action.kind(), depth = self.depth, "Dropping action: dispatch nested too deep");
            return;
        }
        self.depth += 1;
        self.run_chain(action);
        self.depth -= 1;
    }

    fn run_chain(&mut self, action: Action) {
        let stages = Arc::clone(&self.stages);
        let sink = Arc::clone(&self.token_sink);
        let now = self.clock.now();
        trace!(action = %action.kind(), "Dispatch");

        for stage in stages.iter() {
            let mut cx = StageContext::new(now, sink.as_ref());
            let flow = stage.before(&self.state, &action, &mut cx);
            self.absorb(cx.dispatched, cx.effects);
            if flow == Flow::Swallow {
                trace!(action = %action.kind(), stage = stage.name(), "Action swallowed");
                return;
            }
        }

        reduce(&mut self.state, &action, now);

        for stage in stages.iter() {
            let mut cx = StageContext::new(now, sink.as_ref());
            stage.after(&self.state, &action, &mut cx);
            self.absorb(cx.dispatched, cx.effects);
        }
    }

    fn absorb(&mut self, dispatched: Vec<Action>, effects: Vec<Effect>) {
        self.effects.extend(effects);
        for derived in dispatched {
            self.dispatch(derived);
        }
    }
}
