//! Email Drafting — single-professor outreach generation.

use serde_json::{json, Value};
use tracing::warn;

use crate::llm_client::{recovery, GeminiClient, GenerateOptions, PRO_MODEL};
use crate::matching::prompts::DRAFT_PROMPT_TEMPLATE;
use crate::models::{EmailDraft, Language, Professor, StudentProfile};

/// Generates a tailored inquiry email for one professor.
///
/// Failures never propagate. A reply with no recoverable draft and a failed
/// call produce distinct fallback drafts so the two degradations stay
/// distinguishable in the output.
pub async fn draft_email(
    profile: &StudentProfile,
    professor: &Professor,
    language: Language,
    llm: &GeminiClient,
) -> EmailDraft {
    let prompt = DRAFT_PROMPT_TEMPLATE
        .replace("{language}", language.prompt_name())
        .replace("{name}", &profile.name)
        .replace("{education}", &profile.education)
        .replace("{skills}", &profile.skills)
        .replace("{professor}", &professor.name)
        .replace("{bio}", &professor.bio);
    let options = GenerateOptions {
        response_schema: Some(draft_schema()),
        ..Default::default()
    };

    match llm.call(PRO_MODEL, &prompt, &options).await {
        Ok(response) => {
            recovery::extract_as(response.text().as_deref()).unwrap_or_else(|| {
                warn!(
                    "Draft for {} returned no usable JSON; applying fallback",
                    professor.name
                );
                unrecoverable_reply_draft()
            })
        }
        Err(e) => {
            warn!("Draft call for {} failed: {e}; applying fallback", professor.name);
            failed_call_draft()
        }
    }
}

/// Fallback when the reply carried no recoverable draft.
pub fn unrecoverable_reply_draft() -> EmailDraft {
    EmailDraft {
        subject: "Research Inquiry".to_string(),
        body: "Draft failed to generate.".to_string(),
    }
}

/// Fallback when the backend call itself failed.
pub fn failed_call_draft() -> EmailDraft {
    EmailDraft {
        subject: "Inquiry".to_string(),
        body: "Could not generate email draft at this time.".to_string(),
    }
}

fn draft_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "subject": {"type": "STRING"},
            "body": {"type": "STRING"}
        },
        "required": ["subject", "body"]
    })
}
