//! Wizard state machine — pure state plus transition functions.
//!
//! Transitions that need a gateway call are split in two: the controller
//! validates and records the intent, performs the call without holding the
//! session lock, then applies the outcome as a second event. Outcome events
//! (`ResultsReady`, `DraftReady`, auto-fill) apply regardless of the step a
//! navigating user has moved to meanwhile — stale results land in state that
//! may no longer be on screen, which is accepted because nothing destructive
//! follows from it.

use serde::Serialize;
use thiserror::Error;

use crate::models::{
    CvAutofill, DraftStatus, EmailDraft, Language, Professor, SourceRef, StudentProfile, Tier,
};

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Landing,
    Profile,
    Search,
    Results,
    Draft,
}

impl Step {
    /// Wizard progress for the step indicator.
    pub fn progress(self) -> u8 {
        match self {
            Step::Landing => 0,
            Step::Profile => 25,
            Step::Search => 50,
            Step::Results => 75,
            Step::Draft => 100,
        }
    }
}

/// Overlay views reachable from any step. Home navigation returns to the
/// app view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    App,
    Terms,
    Privacy,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    #[error("this action is not available on the current step")]
    WrongStep,

    #[error("name, education, skills, and interests are all required")]
    IncompleteProfile,

    #[error("university and department are both required")]
    MissingSearchTarget,

    #[error("no professor at index {0}")]
    UnknownProfessor(usize),

    #[error("a draft for this professor is already being generated")]
    DraftInFlight,

    #[error("bulk generation is already running for this session")]
    BulkInProgress,

    #[error("draft status cannot change from {from:?} to {to:?}")]
    InvalidStatus { from: DraftStatus, to: DraftStatus },
}

/// Everything that can happen to a session.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Landing → Profile, user-initiated.
    Begin,
    /// Raw CV text extracted from an uploaded document.
    CvExtracted { text: String },
    /// ParseCV outcome; merged only into still-empty profile fields.
    CvAutofilled { autofill: CvAutofill },
    /// Profile form submitted; Profile → Search when complete.
    ProfileSubmitted { profile: StudentProfile },
    /// Search form submitted; records the target, stays on Search until
    /// results arrive.
    SearchSubmitted {
        university: String,
        department: String,
    },
    /// Discovery + matching outcome; → Results with a fresh idle slate.
    ResultsReady {
        professors: Vec<Professor>,
        sources: Vec<SourceRef>,
    },
    /// Interactive draft outcome; → Draft with the transient draft selected.
    DraftReady { index: usize, draft: EmailDraft },
    /// Draft → Results, explicit back navigation.
    BackToResults,
    /// Any step → Landing, explicit home navigation.
    GoHome,
    /// Overlay navigation (terms / privacy / back to app).
    ViewChanged { view: View },
    LanguageChanged { language: Language },
    /// Claims the session's single bulk-generation slot.
    BulkStarted { tier: Tier },
    /// One professor's draft status moved (bulk loop bookkeeping).
    DraftStatusChanged { index: usize, status: DraftStatus },
    /// One bulk draft completed: stores the draft, marks completed.
    BulkDraftStored { index: usize, draft: EmailDraft },
    /// Releases the bulk slot.
    BulkFinished,
}

/// The whole wizard state for one session. Owned exclusively by the session
/// controller; gateway and recovery code never touch it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub step: Step,
    pub view: View,
    pub language: Language,
    pub profile: StudentProfile,
    pub university: String,
    pub department: String,
    pub professors: Vec<Professor>,
    pub sources: Vec<SourceRef>,
    /// Index of the professor whose draft is open on the Draft step.
    pub selected: Option<usize>,
    /// Transient draft shown on the Draft step (single-selection mode).
    pub email_draft: Option<EmailDraft>,
    pub bulk_running: bool,
}

impl PipelineState {
    /// Applies one event, mutating the state on success. On error the state
    /// is unchanged.
    pub fn apply(&mut self, event: PipelineEvent) -> Result<(), TransitionError> {
        match event {
            PipelineEvent::Begin => {
                if self.step != Step::Landing {
                    return Err(TransitionError::WrongStep);
                }
                self.step = Step::Profile;
            }
            PipelineEvent::CvExtracted { text } => {
                self.profile.cv_text = text;
            }
            PipelineEvent::CvAutofilled { autofill } => {
                self.profile.merge_autofill(autofill);
            }
            PipelineEvent::ProfileSubmitted { profile } => {
                if self.step != Step::Profile {
                    return Err(TransitionError::WrongStep);
                }
                if !profile.is_complete() {
                    return Err(TransitionError::IncompleteProfile);
                }
                let cv_text = std::mem::take(&mut self.profile.cv_text);
                self.profile = StudentProfile { cv_text, ..profile };
                self.step = Step::Search;
            }
            PipelineEvent::SearchSubmitted {
                university,
                department,
            } => {
                if self.step != Step::Search {
                    return Err(TransitionError::WrongStep);
                }
                if self.bulk_running {
                    return Err(TransitionError::BulkInProgress);
                }
                if university.trim().is_empty() || department.trim().is_empty() {
                    return Err(TransitionError::MissingSearchTarget);
                }
                self.university = university;
                self.department = department;
            }
            PipelineEvent::ResultsReady {
                mut professors,
                sources,
            } => {
                if self.bulk_running {
                    return Err(TransitionError::BulkInProgress);
                }
                for professor in &mut professors {
                    professor.draft_status = DraftStatus::Idle;
                }
                self.professors = professors;
                self.sources = sources;
                self.selected = None;
                self.email_draft = None;
                self.step = Step::Results;
            }
            PipelineEvent::DraftReady { index, draft } => {
                if index >= self.professors.len() {
                    return Err(TransitionError::UnknownProfessor(index));
                }
                self.selected = Some(index);
                self.email_draft = Some(draft);
                self.step = Step::Draft;
            }
            PipelineEvent::BackToResults => {
                if self.step != Step::Draft {
                    return Err(TransitionError::WrongStep);
                }
                self.step = Step::Results;
            }
            PipelineEvent::GoHome => {
                self.view = View::App;
                self.step = Step::Landing;
            }
            PipelineEvent::ViewChanged { view } => {
                self.view = view;
            }
            PipelineEvent::LanguageChanged { language } => {
                self.language = language;
            }
            PipelineEvent::BulkStarted { tier: _ } => {
                if self.step != Step::Results {
                    return Err(TransitionError::WrongStep);
                }
                if self.bulk_running {
                    return Err(TransitionError::BulkInProgress);
                }
                self.bulk_running = true;
            }
            PipelineEvent::DraftStatusChanged { index, status } => {
                let professor = self
                    .professors
                    .get_mut(index)
                    .ok_or(TransitionError::UnknownProfessor(index))?;
                let from = professor.draft_status;
                let legal = matches!(
                    (from, status),
                    (DraftStatus::Idle, DraftStatus::Loading)
                        | (DraftStatus::Completed, DraftStatus::Loading)
                        | (DraftStatus::Loading, DraftStatus::Idle)
                        | (DraftStatus::Loading, DraftStatus::Completed)
                );
                if !legal {
                    return Err(TransitionError::InvalidStatus { from, to: status });
                }
                professor.draft_status = status;
            }
            PipelineEvent::BulkDraftStored { index, draft } => {
                let professor = self
                    .professors
                    .get_mut(index)
                    .ok_or(TransitionError::UnknownProfessor(index))?;
                if professor.draft_status != DraftStatus::Loading {
                    return Err(TransitionError::InvalidStatus {
                        from: professor.draft_status,
                        to: DraftStatus::Completed,
                    });
                }
                professor.generated_draft = Some(draft);
                professor.draft_status = DraftStatus::Completed;
            }
            PipelineEvent::BulkFinished => {
                self.bulk_running = false;
            }
        }
        Ok(())
    }

    /// Validates that an interactive draft may start for this professor.
    pub fn ensure_draftable(&self, index: usize) -> Result<&Professor, TransitionError> {
        if self.step != Step::Results {
            return Err(TransitionError::WrongStep);
        }
        let professor = self
            .professors
            .get(index)
            .ok_or(TransitionError::UnknownProfessor(index))?;
        if professor.draft_status == DraftStatus::Loading {
            return Err(TransitionError::DraftInFlight);
        }
        Ok(professor)
    }

    /// Professor indices belonging to a tier, in list order.
    pub fn tier_indices(&self, tier: Tier) -> Vec<usize> {
        self.professors
            .iter()
            .enumerate()
            .filter(|(_, p)| p.tier == Some(tier))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> StudentProfile {
        StudentProfile {
            name: "Alex Rivera".to_string(),
            education: "Engineering, sophomore".to_string(),
            interests: "Synthetic Biology".to_string(),
            skills: "Python, CRISPR".to_string(),
            cv_text: String::new(),
        }
    }

    fn state_on(step: Step) -> PipelineState {
        PipelineState {
            step,
            ..Default::default()
        }
    }

    fn professor_with_tier(name: &str, tier: Tier) -> Professor {
        Professor {
            tier: Some(tier),
            ..Professor::new(name)
        }
    }

    #[test]
    fn test_begin_moves_landing_to_profile() {
        let mut state = PipelineState::default();
        state.apply(PipelineEvent::Begin).unwrap();
        assert_eq!(state.step, Step::Profile);
    }

    #[test]
    fn test_begin_rejected_off_landing() {
        let mut state = state_on(Step::Results);
        assert_eq!(
            state.apply(PipelineEvent::Begin),
            Err(TransitionError::WrongStep)
        );
        assert_eq!(state.step, Step::Results);
    }

    #[test]
    fn test_profile_submission_requires_completeness() {
        let mut state = state_on(Step::Profile);
        let incomplete = StudentProfile {
            name: "Alex".to_string(),
            ..Default::default()
        };
        assert_eq!(
            state.apply(PipelineEvent::ProfileSubmitted {
                profile: incomplete
            }),
            Err(TransitionError::IncompleteProfile)
        );
        assert_eq!(state.step, Step::Profile);

        state
            .apply(PipelineEvent::ProfileSubmitted {
                profile: complete_profile(),
            })
            .unwrap();
        assert_eq!(state.step, Step::Search);
    }

    #[test]
    fn test_profile_submission_preserves_cv_text() {
        let mut state = state_on(Step::Profile);
        state
            .apply(PipelineEvent::CvExtracted {
                text: "raw cv".to_string(),
            })
            .unwrap();
        state
            .apply(PipelineEvent::ProfileSubmitted {
                profile: complete_profile(),
            })
            .unwrap();
        assert_eq!(state.profile.cv_text, "raw cv");
    }

    #[test]
    fn test_search_submission_requires_both_fields() {
        let mut state = state_on(Step::Search);
        assert_eq!(
            state.apply(PipelineEvent::SearchSubmitted {
                university: "Stanford University".to_string(),
                department: "  ".to_string(),
            }),
            Err(TransitionError::MissingSearchTarget)
        );

        state
            .apply(PipelineEvent::SearchSubmitted {
                university: "Stanford University".to_string(),
                department: "Biology".to_string(),
            })
            .unwrap();
        // Recording the target does not advance the step; results do.
        assert_eq!(state.step, Step::Search);
    }

    #[test]
    fn test_results_reset_slate_to_idle_and_clear_selection() {
        let mut state = state_on(Step::Search);
        state.selected = Some(3);
        state.email_draft = Some(EmailDraft {
            subject: "old".to_string(),
            body: "old".to_string(),
        });

        let mut stale = Professor::new("A");
        stale.draft_status = DraftStatus::Completed;
        state
            .apply(PipelineEvent::ResultsReady {
                professors: vec![stale],
                sources: vec![],
            })
            .unwrap();

        assert_eq!(state.step, Step::Results);
        assert_eq!(state.professors[0].draft_status, DraftStatus::Idle);
        assert!(state.selected.is_none());
        assert!(state.email_draft.is_none());
    }

    #[test]
    fn test_draft_ready_selects_and_advances() {
        let mut state = state_on(Step::Results);
        state.professors = vec![Professor::new("A"), Professor::new("B")];
        state
            .apply(PipelineEvent::DraftReady {
                index: 1,
                draft: EmailDraft {
                    subject: "s".to_string(),
                    body: "b".to_string(),
                },
            })
            .unwrap();
        assert_eq!(state.step, Step::Draft);
        assert_eq!(state.selected, Some(1));
        assert!(state.email_draft.is_some());
    }

    #[test]
    fn test_back_only_from_draft() {
        let mut state = state_on(Step::Draft);
        state.apply(PipelineEvent::BackToResults).unwrap();
        assert_eq!(state.step, Step::Results);

        assert_eq!(
            state_on(Step::Search).apply(PipelineEvent::BackToResults),
            Err(TransitionError::WrongStep)
        );
    }

    #[test]
    fn test_home_allowed_from_any_step_and_keeps_data() {
        for step in [Step::Profile, Step::Search, Step::Results, Step::Draft] {
            let mut state = state_on(step);
            state.professors = vec![Professor::new("A")];
            state.view = View::Terms;
            state.apply(PipelineEvent::GoHome).unwrap();
            assert_eq!(state.step, Step::Landing);
            assert_eq!(state.view, View::App);
            // Nothing is persisted beyond the session, so nothing to discard.
            assert_eq!(state.professors.len(), 1);
        }
    }

    #[test]
    fn test_overlay_views_reachable_from_any_step() {
        let mut state = state_on(Step::Results);
        state
            .apply(PipelineEvent::ViewChanged { view: View::Privacy })
            .unwrap();
        assert_eq!(state.view, View::Privacy);
        // Leaving the overlay restores the step untouched.
        state
            .apply(PipelineEvent::ViewChanged { view: View::App })
            .unwrap();
        assert_eq!(state.step, Step::Results);
    }

    #[test]
    fn test_bulk_slot_is_exclusive() {
        let mut state = state_on(Step::Results);
        state.professors = vec![professor_with_tier("A", Tier::High)];
        state
            .apply(PipelineEvent::BulkStarted { tier: Tier::High })
            .unwrap();
        assert_eq!(
            state.apply(PipelineEvent::BulkStarted { tier: Tier::High }),
            Err(TransitionError::BulkInProgress)
        );
        state.apply(PipelineEvent::BulkFinished).unwrap();
        assert!(!state.bulk_running);
    }

    #[test]
    fn test_draft_status_transitions_follow_the_invariant() {
        let mut state = state_on(Step::Results);
        state.professors = vec![Professor::new("A")];

        // idle → completed is illegal without passing through loading.
        assert!(matches!(
            state.apply(PipelineEvent::DraftStatusChanged {
                index: 0,
                status: DraftStatus::Completed,
            }),
            Err(TransitionError::InvalidStatus { .. })
        ));

        state
            .apply(PipelineEvent::DraftStatusChanged {
                index: 0,
                status: DraftStatus::Loading,
            })
            .unwrap();
        state
            .apply(PipelineEvent::DraftStatusChanged {
                index: 0,
                status: DraftStatus::Idle,
            })
            .unwrap();
        assert_eq!(state.professors[0].draft_status, DraftStatus::Idle);
    }

    #[test]
    fn test_bulk_store_requires_loading() {
        let mut state = state_on(Step::Results);
        state.professors = vec![Professor::new("A")];
        let draft = EmailDraft {
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(state
            .apply(PipelineEvent::BulkDraftStored {
                index: 0,
                draft: draft.clone(),
            })
            .is_err());

        state
            .apply(PipelineEvent::DraftStatusChanged {
                index: 0,
                status: DraftStatus::Loading,
            })
            .unwrap();
        state
            .apply(PipelineEvent::BulkDraftStored { index: 0, draft })
            .unwrap();
        assert_eq!(state.professors[0].draft_status, DraftStatus::Completed);
        assert!(state.professors[0].generated_draft.is_some());
    }

    #[test]
    fn test_ensure_draftable_refuses_in_flight_professor() {
        let mut state = state_on(Step::Results);
        state.professors = vec![Professor::new("A")];
        state.professors[0].draft_status = DraftStatus::Loading;
        assert_eq!(
            state.ensure_draftable(0).unwrap_err(),
            TransitionError::DraftInFlight
        );
        assert_eq!(
            state.ensure_draftable(5).unwrap_err(),
            TransitionError::UnknownProfessor(5)
        );
    }

    #[test]
    fn test_tier_indices_preserve_list_order() {
        let mut state = state_on(Step::Results);
        state.professors = vec![
            professor_with_tier("A", Tier::Strong),
            professor_with_tier("B", Tier::High),
            professor_with_tier("C", Tier::Strong),
        ];
        assert_eq!(state.tier_indices(Tier::Strong), vec![0, 2]);
        assert_eq!(state.tier_indices(Tier::High), vec![1]);
        assert!(state.tier_indices(Tier::Potential).is_empty());
    }

    #[test]
    fn test_step_progress_is_monotonic() {
        let steps = [
            Step::Landing,
            Step::Profile,
            Step::Search,
            Step::Results,
            Step::Draft,
        ];
        for pair in steps.windows(2) {
            assert!(pair[0].progress() < pair[1].progress());
        }
    }
}
