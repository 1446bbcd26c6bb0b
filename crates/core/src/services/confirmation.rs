//! Typed-word confirmation gate for destructive bulk actions.

use serde::Serialize;

use super::eligibility::EligibilityReport;

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// No eligibility check has completed yet.
    Idle,
    AwaitingConfirmationText,
    Confirmed,
}

/// Whether `text` matches the confirmation word, ignoring case and
/// surrounding whitespace.
#[must_use]
pub fn matches_confirmation_word(text: &str, word: &str) -> bool {
    text.trim().to_lowercase() == word.trim().to_lowercase()
}

/// Confirmation gate of one removal dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationGate {
    word: String,
    state: GateState,
    has_eligible: bool,
    deactivate_ineligible: bool,
}

impl ConfirmationGate {
    #[must_use]
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            state: GateState::Idle,
            has_eligible: false,
            deactivate_ineligible: false,
        }
    }

    /// Record a completed eligibility check. Any previously typed text is
    /// discarded.
    pub fn check_completed(&mut self, report: &EligibilityReport) {
        self.has_eligible = report.eligible_for_deletion().next().is_some();
        self.state = GateState::AwaitingConfirmationText;
    }

    /// Re-evaluate the gate against newly typed text. Ignored while idle.
    pub fn set_text(&mut self, text: &str) {
        if self.state == GateState::Idle {
            return;
        }
        self.state = if matches_confirmation_word(text, &self.word) {
            GateState::Confirmed
        } else {
            GateState::AwaitingConfirmationText
        };
    }

    pub fn set_deactivate_ineligible(&mut self, enabled: bool) {
        self.deactivate_ineligible = enabled;
    }

    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub const fn deactivate_ineligible(&self) -> bool {
        self.deactivate_ineligible
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whether the confirm action may run: the check completed, there is
    /// something to do, and the word matches.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.state == GateState::Confirmed && (self.has_eligible || self.deactivate_ineligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::eligibility::{DependencyKind, UserEligibility};

    fn user(id: &str, can_delete: bool) -> UserEligibility {
        UserEligibility {
            user_id: id.to_string(),
            name: id.to_string(),
            email: None,
            has_enrollment: !can_delete,
            has_payment: false,
            has_report: false,
            reasons: if can_delete {
                vec![]
            } else {
                vec![DependencyKind::Enrollment]
            },
            can_delete,
        }
    }

    #[test]
    fn test_idle_until_check_completes() {
        let mut gate = ConfirmationGate::new("REMOVER");
        gate.set_text("REMOVER");
        assert_eq!(gate.state(), GateState::Idle);
        assert!(!gate.can_confirm());
    }

    #[test]
    fn test_lowercase_word_enables_confirm() {
        let mut gate = ConfirmationGate::new("REMOVER");
        gate.check_completed(&EligibilityReport::new(vec![user("u1", true)]));
        assert_eq!(gate.state(), GateState::AwaitingConfirmationText);

        gate.set_text("remover");
        assert_eq!(gate.state(), GateState::Confirmed);
        assert!(gate.can_confirm());
    }

    #[test]
    fn test_wrong_word_disables_confirm() {
        let mut gate = ConfirmationGate::new("REMOVER");
        gate.check_completed(&EligibilityReport::new(vec![user("u1", true)]));

        for text in ["", "REMOVE", "REMOVERR", "r e m o v e r"] {
            gate.set_text(text);
            assert_eq!(gate.state(), GateState::AwaitingConfirmationText, "{text}");
            assert!(!gate.can_confirm(), "{text}");
        }

        gate.set_text("  Remover ");
        assert!(gate.can_confirm());
        gate.set_text("nope");
        assert!(!gate.can_confirm());
    }

    #[test]
    fn test_nothing_to_do_without_opt_in() {
        let mut gate = ConfirmationGate::new("REMOVER");
        gate.check_completed(&EligibilityReport::new(vec![user("u1", false)]));
        gate.set_text("REMOVER");
        assert!(!gate.can_confirm());

        gate.set_deactivate_ineligible(true);
        assert!(gate.can_confirm());
    }
}
