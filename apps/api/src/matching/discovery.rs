//! Faculty Discovery — live-search-grounded professor lookup.

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{recovery, GeminiClient, GenerateOptions, PRO_MODEL};
use crate::matching::prompts::{DISCOVERY_PROMPT_TEMPLATE, DISCOVERY_SYSTEM};
use crate::models::{Professor, SourceRef};

/// A discovery result: the professor slate plus the provenance of the
/// grounded search, independent of individual professors.
#[derive(Debug, Clone, Default)]
pub struct FacultySearch {
    pub professors: Vec<Professor>,
    pub sources: Vec<SourceRef>,
}

/// Searches for faculty in the given department.
///
/// There is no sane default slate, so transport and API failures propagate
/// to the caller. A reply that parses to no professor array yields an empty
/// slate, which is still a successful search.
pub async fn find_faculty(
    university: &str,
    department: &str,
    llm: &GeminiClient,
) -> Result<FacultySearch, AppError> {
    let prompt = DISCOVERY_PROMPT_TEMPLATE
        .replace("{university}", university)
        .replace("{department}", department);
    let options = GenerateOptions {
        system_instruction: Some(DISCOVERY_SYSTEM.to_string()),
        web_search: true,
        ..Default::default()
    };

    let response = llm
        .call(PRO_MODEL, &prompt, &options)
        .await
        .map_err(|e| AppError::Llm(format!("Faculty discovery failed: {e}")))?;

    let professors = parse_professors(response.text().as_deref());

    let sources: Vec<SourceRef> = response
        .grounding_sources()
        .into_iter()
        .map(|web| SourceRef {
            title: web.title,
            uri: web.uri,
        })
        .collect();

    info!(
        "Discovery for {department} at {university}: {} professors, {} sources",
        professors.len(),
        sources.len()
    );

    Ok(FacultySearch {
        professors,
        sources,
    })
}

/// Recovers the professor array from raw model text. Non-array payloads and
/// records without the required fields are dropped, not errors.
fn parse_professors(text: Option<&str>) -> Vec<Professor> {
    match recovery::extract_json(text) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Professor>(item).ok())
            .collect(),
        Some(_) => {
            warn!("Discovery reply parsed to a non-array payload; treating as empty slate");
            Vec::new()
        }
        None => {
            warn!("Discovery reply had no recoverable JSON; treating as empty slate");
            Vec::new()
        }
    }
}
