use serde::{Deserialize, Serialize};

use super::state::{AuthSession, ClientState, UiState};

/// The slices that survive a restart. Documents, analysis results and the
/// activity feed always come back empty and are refetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub auth: AuthSession,
    pub ui: UiState,
}

impl PersistedState {
    pub fn from_state(state: &ClientState) -> Self {
        Self {
            auth: state.auth.clone(),
            ui: state.ui.clone(),
        }
    }

    pub fn rehydrate(self) -> ClientState {
        let mut auth = self.auth;
        auth.refreshing = false;
        // a persisted flag without a token is not a session
        if auth.token.is_none() {
            auth.is_authenticated = false;
        }
        ClientState {
            auth,
            ui: self.ui,
            ..ClientState::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{DocumentSummary, Role, User};
    use chrono::Utc;

    #[test]
    fn only_auth_and_ui_survive() {
        let mut state = ClientState::default();
        state.auth.token = Some("t".into());
        state.auth.is_authenticated = true;
        state.auth.user = Some(User {
            id: "u".into(),
            email: "u@example.com".into(),
            role: Role::Admin,
        });
        state.auth.token_expiry = Some(Utc::now());
        state.ui.location = "/violations".into();
        state.documents.items.push(DocumentSummary {
            id: "d".into(),
            name: None,
            uploaded_at: None,
        });

        let json = PersistedState::from_state(&state).to_json().unwrap();
        assert!(!json.contains("documents"));

        let restored = PersistedState::from_json(&json).unwrap().rehydrate();
        assert_eq!(restored.auth, state.auth);
        assert_eq!(restored.ui.location, "/violations");
        assert!(restored.documents.items.is_empty());
        assert!(restored.analysis.results.is_empty());
    }

    #[test]
    fn authenticated_without_token_is_dropped() {
        let mut persisted = PersistedState::default();
        persisted.auth.is_authenticated = true;
        assert!(!persisted.rehydrate().auth.is_authenticated);
    }
}
