//! Match Scoring — ranks the discovered slate against the student profile.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::llm_client::{recovery, GeminiClient, GenerateOptions, FLASH_MODEL};
use crate::matching::prompts::MATCH_PROMPT_TEMPLATE;
use crate::models::{Professor, StudentProfile, Tier};

/// Bound on professors included in the scoring prompt, to respect
/// request-size limits. Re-association still runs against the full slate.
const SCORING_SLATE_LIMIT: usize = 25;

/// One scored record from the backend.
///
/// `index` echoes the professor's position in the submitted slate and is the
/// preferred re-association key; `name` remains as the legacy fallback for
/// backends that ignore the index instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(default)]
    pub index: Option<usize>,
    pub name: String,
    pub match_score: f32,
    pub tier: Tier,
    pub match_reason: String,
}

/// Scores every professor against the profile.
///
/// Failures never propagate: any call or recovery failure degrades to the
/// uniform fallback (score 50, tier 2) across the whole slate.
pub async fn match_faculty(
    profile: &StudentProfile,
    professors: Vec<Professor>,
    llm: &GeminiClient,
) -> Vec<Professor> {
    if professors.is_empty() {
        return professors;
    }

    let slate = &professors[..professors.len().min(SCORING_SLATE_LIMIT)];
    let slate_json = match serde_json::to_string(slate) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to serialize professor slate: {e}");
            return fallback_scores(professors);
        }
    };

    let prompt = MATCH_PROMPT_TEMPLATE
        .replace("{education}", &profile.education)
        .replace("{skills}", &profile.skills)
        .replace("{interests}", &profile.interests)
        .replace("{professors_json}", &slate_json);
    let options = GenerateOptions {
        response_schema: Some(match_schema()),
        ..Default::default()
    };

    match llm.call(FLASH_MODEL, &prompt, &options).await {
        Ok(response) => {
            match recovery::extract_as::<Vec<MatchRecord>>(response.text().as_deref()) {
                Some(records) => merge_match_results(&professors, records),
                None => {
                    warn!("Match scoring returned no usable JSON; applying uniform fallback");
                    fallback_scores(professors)
                }
            }
        }
        Err(e) => {
            warn!("Match scoring call failed: {e}; applying uniform fallback");
            fallback_scores(professors)
        }
    }
}

/// Uniform fallback when scoring is unavailable: every professor scores 50
/// in tier 2.
pub fn fallback_scores(professors: Vec<Professor>) -> Vec<Professor> {
    professors
        .into_iter()
        .map(|mut professor| {
            professor.match_score = Some(50.0);
            professor.tier = Some(Tier::Strong);
            professor
        })
        .collect()
}

/// Re-associates scored records with their source professors and orders the
/// result.
///
/// Association preference per record: the echoed slate index, then exact
/// name equality, then the first professor in the slate (the legacy unkeyed
/// merge, which can silently mask a renamed professor — kept as the final
/// fallback). Ordering: score descending; equal scores keep the backend's
/// record order.
pub fn merge_match_results(originals: &[Professor], records: Vec<MatchRecord>) -> Vec<Professor> {
    let Some(first) = originals.first() else {
        return Vec::new();
    };

    let mut merged: Vec<Professor> = records
        .into_iter()
        .map(|record| {
            let base = record
                .index
                .and_then(|i| originals.get(i))
                .or_else(|| originals.iter().find(|p| p.name == record.name))
                .unwrap_or(first);

            let mut professor = base.clone();
            professor.name = record.name;
            professor.match_score = Some(record.match_score);
            professor.tier = Some(record.tier);
            professor.match_reason = Some(record.match_reason);
            professor
        })
        .collect();

    merged.sort_by(|a, b| {
        b.match_score
            .unwrap_or(0.0)
            .partial_cmp(&a.match_score.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    });
    merged
}

fn match_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "index": {"type": "INTEGER"},
                "name": {"type": "STRING"},
                "matchScore": {"type": "NUMBER"},
                "tier": {"type": "INTEGER"},
                "matchReason": {"type": "STRING"}
            },
            "required": ["index", "name", "matchScore", "tier", "matchReason"]
        }
    })
}
