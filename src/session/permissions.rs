use tracing::warn;

use super::action::{Action, ActionKind};
use super::stage::{Flow, Stage, StageContext};
use super::state::{ClientState, Notification, NotificationKind, Role};

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const OFFICERS: &[Role] = &[Role::Admin, Role::ComplianceOfficer];
const CONTRIBUTORS: &[Role] = &[Role::Admin, Role::ComplianceOfficer, Role::Analyst];

/// Roles allowed to perform a guarded action. `None` means the kind is not
/// guarded and anyone, anonymous included, may dispatch it.
///
/// Unlisted kinds are permitted. That default is deliberate but debatable:
/// a new domain action lands here as a compile error and must be placed
/// on one side or the other.
pub fn allowed_roles(kind: ActionKind) -> Option<&'static [Role]> {
    match kind {
        ActionKind::DocumentUploaded => Some(CONTRIBUTORS),
        ActionKind::DocumentDeleted => Some(OFFICERS),
        ActionKind::AnalysisRequested => Some(CONTRIBUTORS),
        ActionKind::ViolationResolved => Some(OFFICERS),
        ActionKind::ReportExported => Some(CONTRIBUTORS),
        ActionKind::GuidelinesUpdated => Some(ADMIN_ONLY),
        ActionKind::LoginRequest
        | ActionKind::LoginSuccess
        | ActionKind::LoginFailure
        | ActionKind::RefreshRequest
        | ActionKind::RefreshSuccess
        | ActionKind::RefreshFailure
        | ActionKind::RefreshTimerFired
        | ActionKind::Logout
        | ActionKind::ActivityTouched
        | ActionKind::AnalysisCompleted
        | ActionKind::Navigate
        | ActionKind::AddNotification
        | ActionKind::DismissNotification
        | ActionKind::ActivityRecorded
        | ActionKind::UnauthorizedAction => None,
    }
}

pub fn is_permitted(kind: ActionKind, role: Option<Role>) -> bool {
    match allowed_roles(kind) {
        None => true,
        Some(allowed) => role.is_some_and(|r| allowed.contains(&r)),
    }
}

fn describe(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::DocumentUploaded => "upload documents",
        ActionKind::DocumentDeleted => "delete documents",
        ActionKind::AnalysisRequested => "run analyses",
        ActionKind::ViolationResolved => "resolve violations",
        ActionKind::ReportExported => "export reports",
        ActionKind::GuidelinesUpdated => "update guidelines",
        _ => "perform this action",
    }
}

/// Drops guarded actions the current role may not perform, replacing them
/// with `UNAUTHORIZED_ACTION` and an error notification.
pub struct PermissionGate;

impl Stage for PermissionGate {
    fn name(&self) -> &'static str {
        "permission_gate"
    }

    fn before(&self, state: &ClientState, action: &Action, cx: &mut StageContext<'_>) -> Flow {
        let kind = action.kind();
        let role = state.auth.role();
        if is_permitted(kind, role) {
            return Flow::Forward;
        }

        warn!(action = %kind, ?role, "Blocked unauthorized action");
        cx.dispatch(Action::UnauthorizedAction {
            attempted: kind,
            role,
        });
        cx.dispatch(Action::AddNotification(Notification::new(
            NotificationKind::Error,
            format!("You do not have permission to {}.", describe(kind)),
            cx.now,
        )));
        Flow::Swallow
    }
}
