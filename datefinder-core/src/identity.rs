//! Display-name reconciliation.
//!
//! When someone submits a name that matches an existing participant's (case
//! insensitively), they are asked whether that participant is them. Confirming
//! adopts the existing id and name; denying sends them back to pick another
//! name. The flow is an explicit state machine so it can be driven and tested
//! without any UI.
//!
//! There is no uniqueness enforcement across concurrent proposals: two people
//! confirming the same identity inside one refresh window is a known, rare
//! inconsistency and is not defended against.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::{DateFinderError, DateFinderResult};
use crate::event::{Participant, ParticipantId};

/// The identity a caller ends up bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub id: ParticipantId,
    pub name: String,
}

/// What a proposal led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No collision: the caller keeps (or is assigned) this identity.
    Accept(ResolvedIdentity),
    /// The name matches an existing participant; the caller must confirm or
    /// deny that it is them.
    NeedsConfirmation {
        matched_id: ParticipantId,
        matched_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Input,
    Confirm {
        matched_id: ParticipantId,
        matched_name: String,
    },
    Resolved(ResolvedIdentity),
}

/// Drives `Input -> (Confirm ->) Resolved`.
#[derive(Debug, Clone)]
pub struct IdentityReconciler {
    state: State,
}

impl Default for IdentityReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityReconciler {
    pub fn new() -> Self {
        IdentityReconciler {
            state: State::Input,
        }
    }

    /// Propose a display name.
    ///
    /// The name is trimmed; an empty or whitespace-only name fails with
    /// `InvalidName` and performs no transition. Matching is case-insensitive
    /// against every existing participant except the caller's own entry, so
    /// reaffirming one's own unchanged name never collides with oneself.
    pub fn propose(
        &mut self,
        candidate_name: &str,
        caller_id: Option<&str>,
        participants: &BTreeMap<ParticipantId, Participant>,
    ) -> DateFinderResult<Outcome> {
        let name = candidate_name.trim();
        if name.is_empty() {
            return Err(DateFinderError::InvalidName);
        }

        let needle = name.to_lowercase();
        let collision = participants
            .iter()
            .filter(|(id, _)| caller_id != Some(id.as_str()))
            .find(|(_, p)| p.name.to_lowercase() == needle);

        let outcome = match collision {
            Some((id, existing)) => {
                self.state = State::Confirm {
                    matched_id: id.clone(),
                    matched_name: existing.name.clone(),
                };
                Outcome::NeedsConfirmation {
                    matched_id: id.clone(),
                    matched_name: existing.name.clone(),
                }
            }
            None => {
                let resolved = ResolvedIdentity {
                    id: caller_id
                        .map(str::to_string)
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: name.to_string(),
                };
                self.state = State::Resolved(resolved.clone());
                Outcome::Accept(resolved)
            }
        };

        Ok(outcome)
    }

    /// Adopt the matched participant's identity. Only valid while a collision
    /// is pending; the caller's local binding must be overwritten with the
    /// returned id and name.
    pub fn confirm(&mut self) -> DateFinderResult<ResolvedIdentity> {
        match &self.state {
            State::Confirm {
                matched_id,
                matched_name,
            } => {
                let resolved = ResolvedIdentity {
                    id: matched_id.clone(),
                    name: matched_name.clone(),
                };
                self.state = State::Resolved(resolved.clone());
                Ok(resolved)
            }
            _ => Err(DateFinderError::Identity(
                "no pending name collision to confirm".to_string(),
            )),
        }
    }

    /// Reject the match and return to name input. No identity changes.
    pub fn deny(&mut self) -> DateFinderResult<()> {
        match self.state {
            State::Confirm { .. } => {
                self.state = State::Input;
                Ok(())
            }
            _ => Err(DateFinderError::Identity(
                "no pending name collision to deny".to_string(),
            )),
        }
    }

    /// The final identity, once resolution has completed.
    pub fn resolved(&self) -> Option<&ResolvedIdentity> {
        match &self.state {
            State::Resolved(identity) => Some(identity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn participants(entries: &[(&str, &str)]) -> BTreeMap<ParticipantId, Participant> {
        entries
            .iter()
            .map(|(id, name)| {
                (
                    id.to_string(),
                    Participant {
                        name: name.to_string(),
                        dates: BTreeSet::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_fresh_name_is_accepted_with_new_id() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        let outcome = reconciler.propose("Bob", None, &existing).unwrap();
        match outcome {
            Outcome::Accept(identity) => {
                assert_eq!(identity.name, "Bob");
                assert!(!identity.id.is_empty());
                assert_ne!(identity.id, "p1");
            }
            other => panic!("expected Accept, got {other:?}"),
        }
        assert!(reconciler.resolved().is_some());
    }

    #[test]
    fn test_caller_id_is_reused_on_accept() {
        let mut reconciler = IdentityReconciler::new();
        let outcome = reconciler
            .propose("Bob", Some("device-7"), &participants(&[]))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Accept(ResolvedIdentity {
                id: "device-7".to_string(),
                name: "Bob".to_string(),
            })
        );
    }

    #[test]
    fn test_case_insensitive_collision_needs_confirmation() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        let outcome = reconciler.propose("Alice", Some("other-id"), &existing).unwrap();
        assert_eq!(
            outcome,
            Outcome::NeedsConfirmation {
                matched_id: "p1".to_string(),
                matched_name: "alice".to_string(),
            }
        );
        assert!(reconciler.resolved().is_none());
    }

    #[test]
    fn test_own_entry_never_collides_with_itself() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        let outcome = reconciler.propose("Alice", Some("p1"), &existing).unwrap();
        assert_eq!(
            outcome,
            Outcome::Accept(ResolvedIdentity {
                id: "p1".to_string(),
                name: "Alice".to_string(),
            })
        );
    }

    #[test]
    fn test_confirm_adopts_matched_identity() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        reconciler.propose("ALICE", None, &existing).unwrap();
        let resolved = reconciler.confirm().unwrap();
        assert_eq!(resolved.id, "p1");
        assert_eq!(resolved.name, "alice");
        assert_eq!(reconciler.resolved(), Some(&resolved));
    }

    #[test]
    fn test_deny_returns_to_input_without_identity() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        reconciler.propose("Alice", None, &existing).unwrap();
        reconciler.deny().unwrap();
        assert!(reconciler.resolved().is_none());

        // A different name now resolves directly
        let outcome = reconciler.propose("Alya", None, &existing).unwrap();
        assert!(matches!(outcome, Outcome::Accept(_)));
    }

    #[test]
    fn test_whitespace_name_is_rejected_without_transition() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        let err = reconciler.propose("   ", None, &existing).unwrap_err();
        assert!(matches!(err, DateFinderError::InvalidName));
        assert!(reconciler.resolved().is_none());

        // Machine still accepts a valid proposal afterwards
        assert!(reconciler.propose("Bob", None, &existing).is_ok());
    }

    #[test]
    fn test_name_is_trimmed_before_matching_and_storing() {
        let mut reconciler = IdentityReconciler::new();
        let existing = participants(&[("p1", "alice")]);

        let outcome = reconciler.propose("  alice  ", None, &existing).unwrap();
        assert!(matches!(outcome, Outcome::NeedsConfirmation { .. }));

        let mut fresh = IdentityReconciler::new();
        let outcome = fresh.propose("  Bob  ", None, &existing).unwrap();
        match outcome {
            Outcome::Accept(identity) => assert_eq!(identity.name, "Bob"),
            other => panic!("expected Accept, got {other:?}"),
        }
    }

    #[test]
    fn test_confirm_and_deny_require_a_pending_collision() {
        let mut reconciler = IdentityReconciler::new();
        assert!(matches!(
            reconciler.confirm().unwrap_err(),
            DateFinderError::Identity(_)
        ));
        assert!(matches!(
            reconciler.deny().unwrap_err(),
            DateFinderError::Identity(_)
        ));
    }
}
