use serde::{Deserialize, Serialize};

/// Output language for generated drafts. Mirrors the client's language toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// English name of the language, spliced verbatim into drafting prompts.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Zh => "Chinese",
        }
    }
}

/// A student's academic profile. Created empty at session start, filled by
/// user input and CV auto-fill. Lives for the session; never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub name: String,
    pub education: String,
    pub interests: String,
    pub skills: String,
    /// Raw text extracted from the uploaded CV, kept for matching context.
    #[serde(default)]
    pub cv_text: String,
}

impl StudentProfile {
    /// All required wizard fields are non-empty. The CV itself is optional.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.education.trim().is_empty()
            && !self.interests.trim().is_empty()
            && !self.skills.trim().is_empty()
    }

    /// Merges CV auto-fill data into the profile. A parsed field is only
    /// taken when the corresponding profile field is still empty — a value
    /// the user typed is never overwritten.
    pub fn merge_autofill(&mut self, autofill: CvAutofill) {
        if self.name.trim().is_empty() && !autofill.name.trim().is_empty() {
            self.name = autofill.name;
        }
        if self.education.trim().is_empty() && !autofill.education.trim().is_empty() {
            self.education = autofill.education;
        }
        if self.skills.trim().is_empty() && !autofill.skills.trim().is_empty() {
            self.skills = autofill.skills;
        }
    }
}

/// Fields recovered from a CV by the ParseCV gateway operation. The empty
/// default doubles as the parse-failure fallback, which makes a failed parse
/// a no-op merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvAutofill {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub skills: String,
}
