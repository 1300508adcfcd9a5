//! Session controller — owns all wizard state and sequences gateway calls.
//!
//! The controller is the single writer of pipeline state. Gateway calls are
//! never made while the session lock is held, so observers polling a session
//! see bulk status updates strictly in list order, one professor at a time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::cv_parser;
use crate::matching::gateway::AiGateway;
use crate::models::{DraftStatus, Tier};
use crate::pipeline::state::{PipelineEvent, PipelineState};

/// One wizard session. Nothing is persisted beyond the process.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: PipelineState,
}

/// In-memory session store shared across handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    /// Creates a fresh session on the Landing step.
    pub async fn create(&self) -> (Uuid, DateTime<Utc>, PipelineState) {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let session = Session {
            id,
            created_at,
            state: PipelineState::default(),
        };
        let snapshot = session.state.clone();
        self.inner.write().await.insert(id, session);
        info!("Created session {id}");
        (id, created_at, snapshot)
    }

    /// Read-only snapshot of a session's state.
    pub async fn snapshot(&self, id: Uuid) -> Result<PipelineState, AppError> {
        let sessions = self.inner.read().await;
        sessions
            .get(&id)
            .map(|s| s.state.clone())
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    /// Runs a closure against a session's state under the write lock.
    pub async fn with<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut PipelineState) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        f(&mut session.state)
    }

    /// Applies a single pipeline event under the write lock.
    pub async fn apply(&self, id: Uuid, event: PipelineEvent) -> Result<(), AppError> {
        self.with(id, |state| Ok(state.apply(event)?)).await
    }
}

/// Applies a navigation-only event and returns the new snapshot.
pub async fn navigate(
    store: &SessionStore,
    id: Uuid,
    event: PipelineEvent,
) -> Result<PipelineState, AppError> {
    store.apply(id, event).await?;
    store.snapshot(id).await
}

/// Uploads a CV document: extracts its text, then asks the gateway for
/// auto-fill data and merges it into still-empty profile fields. A parse
/// failure degrades to the empty auto-fill and leaves the profile as typed.
pub async fn upload_cv(
    store: &SessionStore,
    gateway: &dyn AiGateway,
    id: Uuid,
    bytes: &[u8],
    content_type: Option<&str>,
) -> Result<PipelineState, AppError> {
    let text = cv_parser::extract_document_text(bytes, content_type)?;
    store
        .apply(id, PipelineEvent::CvExtracted { text: text.clone() })
        .await?;

    let autofill = gateway.parse_cv(&text).await;
    store
        .apply(id, PipelineEvent::CvAutofilled { autofill })
        .await?;
    store.snapshot(id).await
}

/// Runs discovery then matching for the given search target. On any failure
/// the session remains on the Search step with no slate set.
pub async fn run_search(
    store: &SessionStore,
    gateway: &dyn AiGateway,
    id: Uuid,
    university: String,
    department: String,
) -> Result<PipelineState, AppError> {
    let profile = store
        .with(id, |state| {
            state.apply(PipelineEvent::SearchSubmitted {
                university: university.clone(),
                department: department.clone(),
            })?;
            Ok(state.profile.clone())
        })
        .await?;

    let search = gateway.find_faculty(&university, &department).await?;
    let matched = gateway.match_faculty(&profile, search.professors).await;

    store
        .apply(
            id,
            PipelineEvent::ResultsReady {
                professors: matched,
                sources: search.sources,
            },
        )
        .await?;
    store.snapshot(id).await
}

/// Generates the interactive draft for one professor. On failure the session
/// remains on Results and the error surfaces to the caller.
pub async fn open_draft(
    store: &SessionStore,
    gateway: &dyn AiGateway,
    id: Uuid,
    index: usize,
) -> Result<PipelineState, AppError> {
    let (profile, professor, language) = store
        .with(id, |state| {
            let professor = state.ensure_draftable(index)?.clone();
            Ok((state.profile.clone(), professor, state.language))
        })
        .await?;

    let draft = gateway.draft_email(&profile, &professor, language).await?;

    store
        .apply(id, PipelineEvent::DraftReady { index, draft })
        .await?;
    store.snapshot(id).await
}

/// Generates drafts for every professor in a tier, strictly one at a time in
/// list order. A failed item reverts to idle and the loop continues; the
/// only per-item trace is that professor's status. Re-running reprocesses
/// the whole tier, completed drafts included.
pub async fn bulk_generate(
    store: &SessionStore,
    gateway: &dyn AiGateway,
    id: Uuid,
    tier: Tier,
) -> Result<PipelineState, AppError> {
    let (profile, language, targets) = store
        .with(id, |state| {
            state.apply(PipelineEvent::BulkStarted { tier })?;
            Ok((
                state.profile.clone(),
                state.language,
                state.tier_indices(tier),
            ))
        })
        .await?;

    info!(
        "Bulk generation for tier {} over {} professors",
        tier.as_u8(),
        targets.len()
    );

    for index in targets {
        let professor = match store
            .with(id, |state| {
                state.apply(PipelineEvent::DraftStatusChanged {
                    index,
                    status: DraftStatus::Loading,
                })?;
                Ok(state.professors[index].clone())
            })
            .await
        {
            Ok(professor) => professor,
            Err(e) => {
                // The slate changed under the loop; skip this item.
                warn!("Bulk item {index} skipped: {e}");
                continue;
            }
        };

        match gateway.draft_email(&profile, &professor, language).await {
            Ok(draft) => {
                if let Err(e) = store
                    .apply(id, PipelineEvent::BulkDraftStored { index, draft })
                    .await
                {
                    warn!("Bulk item {index} could not be stored: {e}");
                }
            }
            Err(e) => {
                warn!("Bulk draft for {} failed: {e}", professor.name);
                if let Err(e) = store
                    .apply(
                        id,
                        PipelineEvent::DraftStatusChanged {
                            index,
                            status: DraftStatus::Idle,
                        },
                    )
                    .await
                {
                    warn!("Bulk item {index} could not be reverted: {e}");
                }
            }
        }
    }

    store.apply(id, PipelineEvent::BulkFinished).await?;
    store.snapshot(id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::matching::discovery::FacultySearch;
    use crate::models::{
        CvAutofill, EmailDraft, Language, Professor, SourceRef, StudentProfile,
    };
    use crate::pipeline::state::Step;

    /// Configurable stub backend for pipeline tests.
    #[derive(Default)]
    struct StubGateway {
        autofill: CvAutofill,
        search: Option<FacultySearch>,
        /// Professor names whose draft calls fail.
        failing_drafts: Vec<String>,
        /// Order of professor names passed to draft_email.
        draft_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AiGateway for StubGateway {
        async fn parse_cv(&self, _cv_text: &str) -> CvAutofill {
            self.autofill.clone()
        }

        async fn find_faculty(
            &self,
            _university: &str,
            _department: &str,
        ) -> Result<FacultySearch, AppError> {
            self.search
                .clone()
                .ok_or_else(|| AppError::Llm("Faculty discovery failed: 503".to_string()))
        }

        async fn match_faculty(
            &self,
            _profile: &StudentProfile,
            professors: Vec<Professor>,
        ) -> Vec<Professor> {
            professors
        }

        async fn draft_email(
            &self,
            _profile: &StudentProfile,
            professor: &Professor,
            _language: Language,
        ) -> Result<EmailDraft, AppError> {
            self.draft_calls.lock().unwrap().push(professor.name.clone());
            if self.failing_drafts.contains(&professor.name) {
                return Err(AppError::Llm(format!("draft failed for {}", professor.name)));
            }
            Ok(EmailDraft {
                subject: format!("To {}", professor.name),
                body: "Dear Professor,".to_string(),
            })
        }
    }

    fn tiered(name: &str, tier: Tier) -> Professor {
        Professor {
            tier: Some(tier),
            match_score: Some(50.0),
            ..Professor::new(name)
        }
    }

    fn search_result(professors: Vec<Professor>) -> FacultySearch {
        FacultySearch {
            professors,
            sources: vec![SourceRef {
                title: Some("Faculty Directory".to_string()),
                uri: Some("https://example.edu/faculty".to_string()),
            }],
        }
    }

    /// Drives a fresh session to the Search step.
    async fn session_on_search(store: &SessionStore) -> Uuid {
        let (id, _, _) = store.create().await;
        store.apply(id, PipelineEvent::Begin).await.unwrap();
        store
            .apply(
                id,
                PipelineEvent::ProfileSubmitted {
                    profile: StudentProfile {
                        name: "Alex Rivera".to_string(),
                        education: "Engineering, sophomore".to_string(),
                        interests: "Synthetic Biology".to_string(),
                        skills: "Python, CRISPR".to_string(),
                        cv_text: String::new(),
                    },
                },
            )
            .await
            .unwrap();
        id
    }

    /// Drives a fresh session to Results with the given slate.
    async fn session_on_results(store: &SessionStore, professors: Vec<Professor>) -> Uuid {
        let id = session_on_search(store).await;
        let gateway = StubGateway {
            search: Some(search_result(professors)),
            ..Default::default()
        };
        run_search(
            store,
            &gateway,
            id,
            "Stanford University".to_string(),
            "Biology".to_string(),
        )
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_search_failure_stays_on_search_with_no_slate() {
        let store = SessionStore::default();
        let id = session_on_search(&store).await;
        let gateway = StubGateway::default(); // discovery fails

        let result = run_search(
            &store,
            &gateway,
            id,
            "Stanford University".to_string(),
            "Biology".to_string(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Llm(_))));

        let state = store.snapshot(id).await.unwrap();
        assert_eq!(state.step, Step::Search);
        assert!(state.professors.is_empty());
    }

    #[tokio::test]
    async fn test_search_success_moves_to_results_with_idle_slate() {
        let store = SessionStore::default();
        let id = session_on_results(
            &store,
            vec![tiered("A", Tier::High), tiered("B", Tier::Strong)],
        )
        .await;

        let state = store.snapshot(id).await.unwrap();
        assert_eq!(state.step, Step::Results);
        assert_eq!(state.professors.len(), 2);
        assert!(state
            .professors
            .iter()
            .all(|p| p.draft_status == DraftStatus::Idle));
        assert_eq!(state.sources.len(), 1);
        assert_eq!(state.university, "Stanford University");
    }

    #[tokio::test]
    async fn test_cv_parse_fallback_leaves_user_fields_unchanged() {
        let store = SessionStore::default();
        let (id, _, _) = store.create().await;
        store.apply(id, PipelineEvent::Begin).await.unwrap();
        store
            .with(id, |state| {
                state.profile.name = "Alex Rivera".to_string();
                Ok(())
            })
            .await
            .unwrap();

        // Simulated ParseCV failure: the gateway returns the empty fallback.
        let gateway = StubGateway::default();
        let cv = "John Doe, Stanford University, B.S. Computer Science. Skills: Python, ML.";
        let state = upload_cv(&store, &gateway, id, cv.as_bytes(), Some("text/plain"))
            .await
            .unwrap();

        assert_eq!(state.profile.name, "Alex Rivera");
        assert_eq!(state.profile.education, "");
        assert_eq!(state.profile.cv_text, cv);
    }

    #[tokio::test]
    async fn test_cv_autofill_fills_empty_fields_only() {
        let store = SessionStore::default();
        let (id, _, _) = store.create().await;
        store.apply(id, PipelineEvent::Begin).await.unwrap();
        store
            .with(id, |state| {
                state.profile.name = "Alex Rivera".to_string();
                Ok(())
            })
            .await
            .unwrap();

        let gateway = StubGateway {
            autofill: CvAutofill {
                name: "John Doe".to_string(),
                education: "Stanford University".to_string(),
                skills: "Python, ML".to_string(),
            },
            ..Default::default()
        };
        let state = upload_cv(&store, &gateway, id, b"cv text", Some("text/plain"))
            .await
            .unwrap();

        assert_eq!(state.profile.name, "Alex Rivera");
        assert_eq!(state.profile.education, "Stanford University");
        assert_eq!(state.profile.skills, "Python, ML");
    }

    #[tokio::test]
    async fn test_invalid_document_surfaces_and_touches_nothing() {
        let store = SessionStore::default();
        let (id, _, _) = store.create().await;
        store.apply(id, PipelineEvent::Begin).await.unwrap();

        let gateway = StubGateway::default();
        let result = upload_cv(&store, &gateway, id, &[0xff, 0xfe], Some("text/plain")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let state = store.snapshot(id).await.unwrap();
        assert!(state.profile.cv_text.is_empty());
    }

    #[tokio::test]
    async fn test_open_draft_moves_to_draft_step() {
        let store = SessionStore::default();
        let id = session_on_results(&store, vec![tiered("A", Tier::High)]).await;
        let gateway = StubGateway {
            search: None,
            ..Default::default()
        };

        let state = open_draft(&store, &gateway, id, 0).await.unwrap();
        assert_eq!(state.step, Step::Draft);
        assert_eq!(state.selected, Some(0));
        assert_eq!(state.email_draft.as_ref().unwrap().subject, "To A");
        // Interactive drafting does not touch the bulk status.
        assert_eq!(state.professors[0].draft_status, DraftStatus::Idle);
    }

    #[tokio::test]
    async fn test_open_draft_failure_stays_on_results() {
        let store = SessionStore::default();
        let id = session_on_results(&store, vec![tiered("A", Tier::High)]).await;
        let gateway = StubGateway {
            failing_drafts: vec!["A".to_string()],
            ..Default::default()
        };

        let result = open_draft(&store, &gateway, id, 0).await;
        assert!(matches!(result, Err(AppError::Llm(_))));

        let state = store.snapshot(id).await.unwrap();
        assert_eq!(state.step, Step::Results);
        assert!(state.email_draft.is_none());
    }

    #[tokio::test]
    async fn test_bulk_processes_tier_in_list_order() {
        let store = SessionStore::default();
        let id = session_on_results(
            &store,
            vec![
                tiered("P1", Tier::High),
                tiered("skip", Tier::Strong),
                tiered("P2", Tier::High),
                tiered("P3", Tier::High),
            ],
        )
        .await;
        let gateway = StubGateway::default();

        let state = bulk_generate(&store, &gateway, id, Tier::High).await.unwrap();

        // One call per tier member, strictly in list order, none interleaved.
        assert_eq!(
            *gateway.draft_calls.lock().unwrap(),
            vec!["P1".to_string(), "P2".to_string(), "P3".to_string()]
        );
        assert_eq!(state.professors[0].draft_status, DraftStatus::Completed);
        assert_eq!(state.professors[1].draft_status, DraftStatus::Idle);
        assert_eq!(state.professors[2].draft_status, DraftStatus::Completed);
        assert_eq!(state.professors[3].draft_status, DraftStatus::Completed);
        assert!(!state.bulk_running);
    }

    #[tokio::test]
    async fn test_bulk_failure_reverts_item_and_continues() {
        let store = SessionStore::default();
        let id = session_on_results(
            &store,
            vec![
                tiered("P1", Tier::High),
                tiered("P2", Tier::High),
                tiered("P3", Tier::High),
            ],
        )
        .await;
        let gateway = StubGateway {
            failing_drafts: vec!["P2".to_string()],
            ..Default::default()
        };

        let state = bulk_generate(&store, &gateway, id, Tier::High).await.unwrap();

        // The failure is silent per-item: P2 reverts to idle, P3 still ran.
        assert_eq!(state.professors[0].draft_status, DraftStatus::Completed);
        assert_eq!(state.professors[1].draft_status, DraftStatus::Idle);
        assert!(state.professors[1].generated_draft.is_none());
        assert_eq!(state.professors[2].draft_status, DraftStatus::Completed);
        assert_eq!(gateway.draft_calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_bulk_on_empty_tier_is_a_noop() {
        let store = SessionStore::default();
        let id = session_on_results(&store, vec![tiered("A", Tier::High)]).await;
        let gateway = StubGateway::default();

        let state = bulk_generate(&store, &gateway, id, Tier::Potential)
            .await
            .unwrap();
        assert!(gateway.draft_calls.lock().unwrap().is_empty());
        assert!(!state.bulk_running);
    }

    #[tokio::test]
    async fn test_bulk_rerun_reprocesses_completed_drafts() {
        let store = SessionStore::default();
        let id = session_on_results(&store, vec![tiered("A", Tier::High)]).await;
        let gateway = StubGateway::default();

        bulk_generate(&store, &gateway, id, Tier::High).await.unwrap();
        bulk_generate(&store, &gateway, id, Tier::High).await.unwrap();

        // No per-item retry exists; the whole tier runs again.
        assert_eq!(gateway.draft_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = SessionStore::default();
        let result = store.snapshot(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
