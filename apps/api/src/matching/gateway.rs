//! The AI gateway trait — the pipeline's only view of the generative backend.
//!
//! Carried in `AppState` as `Arc<dyn AiGateway>`, so tests can drive the full
//! pipeline with stub backends. Failure policy per operation:
//!
//! - `parse_cv` and `match_faculty` absorb all failures into typed fallbacks
//!   and are infallible at the trait.
//! - `find_faculty` has no sane default slate; failures propagate.
//! - `draft_email` is fallible at the trait so the pipeline's failure policy
//!   (stay on Results / revert a bulk item to idle) stays honest, even
//!   though the production backend absorbs its failures into fallback
//!   drafts and never returns `Err`.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::GeminiClient;
use crate::matching::discovery::FacultySearch;
use crate::matching::{cv_parser, discovery, drafting, scoring};
use crate::models::{CvAutofill, EmailDraft, Language, Professor, StudentProfile};

#[async_trait]
pub trait AiGateway: Send + Sync {
    /// CV auto-fill extraction.
    async fn parse_cv(&self, cv_text: &str) -> CvAutofill;

    /// Faculty discovery with source provenance.
    async fn find_faculty(
        &self,
        university: &str,
        department: &str,
    ) -> Result<FacultySearch, AppError>;

    /// Scores and re-associates the slate; output ordered by score.
    async fn match_faculty(
        &self,
        profile: &StudentProfile,
        professors: Vec<Professor>,
    ) -> Vec<Professor>;

    /// Drafts one outreach email.
    async fn draft_email(
        &self,
        profile: &StudentProfile,
        professor: &Professor,
        language: Language,
    ) -> Result<EmailDraft, AppError>;
}

/// Production gateway backed by the Gemini client.
pub struct GeminiGateway {
    llm: GeminiClient,
}

impl GeminiGateway {
    pub fn new(llm: GeminiClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn parse_cv(&self, cv_text: &str) -> CvAutofill {
        cv_parser::parse_cv(cv_text, &self.llm).await
    }

    async fn find_faculty(
        &self,
        university: &str,
        department: &str,
    ) -> Result<FacultySearch, AppError> {
        discovery::find_faculty(university, department, &self.llm).await
    }

    async fn match_faculty(
        &self,
        profile: &StudentProfile,
        professors: Vec<Professor>,
    ) -> Vec<Professor> {
        scoring::match_faculty(profile, professors, &self.llm).await
    }

    async fn draft_email(
        &self,
        profile: &StudentProfile,
        professor: &Professor,
        language: Language,
    ) -> Result<EmailDraft, AppError> {
        Ok(drafting::draft_email(profile, professor, language, &self.llm).await)
    }
}
