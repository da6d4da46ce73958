use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use super::action::{Action, ActionKind};
use super::stage::{Stage, StageContext};
use super::state::{ActivityEntry, ActivityType, ClientState};

pub fn is_trackable(kind: ActionKind) -> bool {
    matches!(
        kind,
        ActionKind::LoginSuccess
            | ActionKind::DocumentUploaded
            | ActionKind::DocumentDeleted
            | ActionKind::AnalysisCompleted
            | ActionKind::ViolationResolved
            | ActionKind::ReportExported
            | ActionKind::GuidelinesUpdated
    )
}

pub fn classify(kind: ActionKind) -> ActivityType {
    match kind {
        ActionKind::LoginSuccess | ActionKind::Logout => ActivityType::Session,
        ActionKind::DocumentUploaded | ActionKind::DocumentDeleted => ActivityType::Document,
        ActionKind::AnalysisRequested | ActionKind::AnalysisCompleted => ActivityType::Analysis,
        ActionKind::ViolationResolved => ActivityType::Violation,
        ActionKind::ReportExported => ActivityType::Report,
        ActionKind::GuidelinesUpdated => ActivityType::Guidelines,
        _ => ActivityType::General,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

// Human title for the feed; missing payload detail falls back to a
// generic label
pub fn title(action: &Action) -> String {
    match action {
        Action::LoginSuccess { user, .. } => match non_empty(&user.email) {
            Some(email) => format!("Signed in as {email}"),
            None => "Signed in".to_string(),
        },
        Action::DocumentUploaded { document } => {
            match document.name.as_deref().and_then(non_empty) {
                Some(name) => format!("Uploaded {name}"),
                None => "Document uploaded".to_string(),
            }
        }
        Action::DocumentDeleted { .. } => "Document deleted".to_string(),
        Action::AnalysisCompleted { result, .. } => match result.violations.len() {
            0 => format!("Analysis complete: score {}, no violations", result.score),
            1 => format!("Analysis complete: score {}, 1 violation", result.score),
            n => format!("Analysis complete: score {}, {n} violations", result.score),
        },
        Action::ViolationResolved { rule, .. } => match non_empty(rule) {
            Some(rule) => format!("Resolved {rule}"),
            None => "Violation resolved".to_string(),
        },
        Action::ReportExported { format, .. } => match non_empty(format) {
            Some(format) => format!("Exported {} report", format.to_uppercase()),
            None => "Report exported".to_string(),
        },
        Action::GuidelinesUpdated { version } => match version.as_deref().and_then(non_empty) {
            Some(v) => format!("Guidelines updated to {v}"),
            None => "Guidelines updated".to_string(),
        },
        other => format!("Activity: {}", other.kind()),
    }
}

fn metadata(action: &Action) -> serde_json::Value {
    match action {
        Action::DocumentUploaded { document } => json!({ "documentId": document.id }),
        Action::DocumentDeleted { document_id }
        | Action::ViolationResolved { document_id, .. } => json!({ "documentId": document_id }),
        Action::AnalysisCompleted {
            document_id,
            result,
        } => json!({
            "documentId": document_id,
            "score": result.score,
            "violations": result.violations.len(),
        }),
        Action::ReportExported {
            document_id,
            format,
        } => json!({ "documentId": document_id, "format": format }),
        _ => json!({}),
    }
}

pub fn activity_entry(action: &Action, at: DateTime<Utc>) -> ActivityEntry {
    ActivityEntry {
        id: Uuid::new_v4(),
        kind: classify(action.kind()),
        title: title(action),
        timestamp: at,
        metadata: metadata(action),
    }
}

/// Appends a dashboard activity entry for trackable actions once they
/// have been applied.
pub struct ActivityTelemetry;

impl Stage for ActivityTelemetry {
    fn name(&self) -> &'static str {
        "activity_telemetry"
    }

    fn after(&self, state: &ClientState, action: &Action, cx: &mut StageContext<'_>) {
        if !state.auth.is_authenticated || !is_trackable(action.kind()) {
            return;
        }
        cx.dispatch(Action::ActivityRecorded(activity_entry(action, cx.now)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, Severity, Violation};
    use crate::session::state::DocumentSummary;

    #[test]
    fn titles_use_payload_detail() {
        let upload = Action::DocumentUploaded {
            document: DocumentSummary {
                id: "d1".into(),
                name: Some("Q3 brochure.pdf".into()),
                uploaded_at: None,
            },
        };
        assert_eq!(title(&upload), "Uploaded Q3 brochure.pdf");

        let export = Action::ReportExported {
            document_id: "d1".into(),
            format: "pdf".into(),
        };
        assert_eq!(title(&export), "Exported PDF report");
    }

    #[test]
    fn missing_detail_degrades_to_generic_label() {
        let upload = Action::DocumentUploaded {
            document: DocumentSummary {
                id: "d1".into(),
                name: Some("  ".into()),
                uploaded_at: None,
            },
        };
        assert_eq!(title(&upload), "Document uploaded");

        let resolved = Action::ViolationResolved {
            document_id: "d1".into(),
            rule: String::new(),
        };
        assert_eq!(title(&resolved), "Violation resolved");
        assert_eq!(
            title(&Action::GuidelinesUpdated { version: None }),
            "Guidelines updated"
        );
    }

    #[test]
    fn analysis_entry_carries_counts() {
        let action = Action::AnalysisCompleted {
            document_id: "d9".into(),
            result: AnalysisResult {
                score: 55,
                summary: String::new(),
                violations: vec![Violation {
                    rule: "FTC-255".into(),
                    description: "unsubstantiated claim".into(),
                    severity: Severity::Medium,
                    excerpt: None,
                    suggestion: None,
                }],
            },
        };
        let entry = activity_entry(&action, Utc::now());
        assert_eq!(entry.kind, ActivityType::Analysis);
        assert_eq!(entry.title, "Analysis complete: score 55, 1 violation");
        assert_eq!(entry.metadata["violations"], 1);
    }

    #[test]
    fn classification_falls_back_to_general() {
        assert_eq!(classify(ActionKind::Navigate), ActivityType::General);
        assert!(!is_trackable(ActionKind::Navigate));
    }
}
