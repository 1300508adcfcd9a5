//! Text recovery — extracts a usable JSON value from free-form model output.
//!
//! Grounded search responses inline citation markers like `[1]` or `[1, 3]`
//! into field values, and models sometimes wrap payloads in markdown fences
//! or conversational prose. Recovery is best-effort: every caller must hold
//! a typed fallback and treat `None` as a normal outcome, never as fatal.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Citation runs: a bracketed run of one or more integers, optionally
/// comma/hyphen/space separated — `[1]`, `[1, 2]`, `[4-6]`.
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+(?:[-,\s]+\d+)*\]").unwrap());

/// Attempts to recover a JSON value from arbitrary model output.
///
/// Ordered attempts, first success wins:
/// 1. missing or empty input yields `None`;
/// 2. strip citation runs, then code-fence markers, then trim;
/// 3. strict parse of the cleaned text;
/// 4. strict parse of the span from the earliest `[`/`{` to the latest
///    `]`/`}`.
///
/// The span heuristic picks its opener and closer independently, so a stray
/// bracket inside a string value can select a mismatched-type span. That
/// span then fails the verifying re-parse and recovery returns `None`; the
/// heuristic is kept as-is rather than made bracket-aware.
pub fn extract_json(text: Option<&str>) -> Option<Value> {
    let text = text?;
    if text.trim().is_empty() {
        return None;
    }

    let cleaned = CITATION_RE.replace_all(text, "");
    let cleaned = cleaned.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Some(value);
    }

    let start = match (cleaned.find('['), cleaned.find('{')) {
        (Some(bracket), Some(brace)) => bracket.min(brace),
        (Some(bracket), None) => bracket,
        (None, Some(brace)) => brace,
        (None, None) => return None,
    };
    let end = match (cleaned.rfind(']'), cleaned.rfind('}')) {
        (Some(bracket), Some(brace)) => bracket.max(brace),
        (Some(bracket), None) => bracket,
        (None, Some(brace)) => brace,
        (None, None) => return None,
    };
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(value) => Some(value),
        Err(_) => {
            let snippet: String = cleaned.chars().take(200).collect();
            debug!("JSON recovery failed; raw text snippet: {snippet}");
            None
        }
    }
}

/// Typed recovery. A payload that parses as JSON but does not match `T` is
/// also a recovery failure.
pub fn extract_as<T: DeserializeOwned>(text: Option<&str>) -> Option<T> {
    serde_json::from_value(extract_json(text)?).ok()
}
