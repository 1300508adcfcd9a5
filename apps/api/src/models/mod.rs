pub mod professor;
pub mod profile;

pub use professor::{DraftStatus, EmailDraft, Professor, SourceRef, Tier};
pub use profile::{CvAutofill, Language, StudentProfile};
