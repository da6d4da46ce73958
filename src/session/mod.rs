//! Client-side auth session lifecycle.
//!
//! Every state change is an [`Action`] dispatched into a [`Store`], which
//! runs it through a fixed chain of stages:
//!
//! 1. [`ExpiryGuard`] stamps activity, logs out expired or idle sessions
//!    and asks for a refresh shortly before the token lapses.
//! 2. [`OutcomeHandler`] follows login/refresh/logout outcomes, keeps the
//!    HTTP client's bearer token current and arms the refresh timer.
//! 3. [`PermissionGate`] drops guarded actions the current role may not
//!    perform.
//! 4. [`ActivityTelemetry`] records trackable actions in the dashboard
//!    activity feed.
//!
//! Session validity is a two-state machine: anonymous becomes
//! authenticated on login success; refresh success keeps it
//! authenticated with a later expiry; logout, expiry and refresh failure
//! return it to anonymous.
//!
//! [`spawn_session`] wraps the store in a task that performs the network
//! and timer effects the stages request.

pub mod action;
pub mod api;
pub mod driver;
pub mod guard;
pub mod outcome;
pub mod permissions;
pub mod persist;
pub mod reducer;
pub mod stage;
pub mod state;
pub mod store;
pub mod telemetry;

pub use action::{Action, ActionKind};
pub use api::{ApiClient, AuthApi, AuthTokenSink, HttpAuthApi, TokenGrant};
pub use driver::{SessionClosed, SessionHandle, spawn_session};
pub use guard::ExpiryGuard;
pub use outcome::OutcomeHandler;
pub use permissions::{PermissionGate, allowed_roles};
pub use persist::PersistedState;
pub use stage::{Effect, Flow, Stage, StageContext};
pub use state::{AuthSession, ClientState, Notification, NotificationKind, Role, User};
pub use store::Store;
pub use telemetry::ActivityTelemetry;
