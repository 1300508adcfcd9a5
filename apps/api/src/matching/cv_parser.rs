//! CV Parser — document text extraction and LLM-backed profile auto-fill.

use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::{recovery, GeminiClient, GenerateOptions, FLASH_MODEL};
use crate::matching::prompts::CV_PARSE_PROMPT_TEMPLATE;
use crate::models::CvAutofill;

/// Bound on CV text included in the prompt, to respect request-size limits.
const CV_PROMPT_LIMIT: usize = 8000;

/// Extracts profile fields from raw CV text.
///
/// Failures never propagate: any call or recovery failure degrades to the
/// empty `CvAutofill`, which merges as a no-op.
pub async fn parse_cv(cv_text: &str, llm: &GeminiClient) -> CvAutofill {
    let prompt =
        CV_PARSE_PROMPT_TEMPLATE.replace("{cv_text}", truncate_chars(cv_text, CV_PROMPT_LIMIT));
    let options = GenerateOptions {
        response_schema: Some(autofill_schema()),
        ..Default::default()
    };

    match llm.call(FLASH_MODEL, &prompt, &options).await {
        Ok(response) => {
            recovery::extract_as(response.text().as_deref()).unwrap_or_else(|| {
                warn!("CV parse returned no usable JSON; auto-fill skipped");
                CvAutofill::default()
            })
        }
        Err(e) => {
            warn!("CV parse call failed: {e}; auto-fill skipped");
            CvAutofill::default()
        }
    }
}

/// Extracts plain text from an uploaded CV document.
///
/// PDFs go through `pdf-extract`, which yields per-page text in page order
/// separated by newlines; anything else is read verbatim as UTF-8.
pub fn extract_document_text(bytes: &[u8], content_type: Option<&str>) -> Result<String, AppError> {
    let is_pdf = content_type.is_some_and(|ct| ct.contains("pdf")) || bytes.starts_with(b"%PDF");

    if is_pdf {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Validation(format!("Failed to read PDF document: {e}")))
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("Document is not valid UTF-8 text".to_string()))
    }
}

/// First `limit` characters of `text`, never splitting a code point.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn autofill_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": {"type": "STRING"},
            "education": {"type": "STRING"},
            "skills": {"type": "STRING"}
        },
        "required": ["name", "education", "skills"]
    })
}
