// All LLM prompt constants for the Matching module.
// Templates use {placeholder} substitution; replace before sending.

/// System instruction for faculty discovery — grounded, JSON-only output.
pub const DISCOVERY_SYSTEM: &str = "You are an academic research assistant. \
    Always respond with a valid JSON array of professor objects. \
    Ground every detail in live web search results from official university domains. \
    Do not include any text other than the JSON.";

/// CV auto-fill extraction. Replace `{cv_text}` before sending.
pub const CV_PARSE_PROMPT_TEMPLATE: &str = r#"Extract profile information from this student's CV text.
Return a JSON object with strictly these keys: "name", "education" (university and degree), and "skills" (technical skills, comma separated).

CV Text:
{cv_text}"#;

/// Faculty discovery. Replace `{university}` and `{department}`.
pub const DISCOVERY_PROMPT_TEMPLATE: &str = r#"Search for a list of at least 15 active faculty members (professors) in the {department} department at {university}.
ONLY provide information from official {university} (.edu) websites.
For each faculty member, include:
- "name": full name
- "title": academic rank (e.g., Assistant Professor)
- "researchInterests": string array of topics
- "bio": a 2-sentence summary of their research focus or lab mission

Output the list as a valid JSON array of objects."#;

/// Match scoring. Replace `{education}`, `{skills}`, `{interests}`,
/// `{professors_json}`. The echoed "index" is the stable re-association key.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Analyze research alignment between this student and the provided faculty members.

Student Data:
- Education: {education}
- Skills: {skills}
- Interests: {interests}

Professors (JSON array; a professor's "index" is its position in this array):
{professors_json}

Return a JSON array of objects with keys: "index" (the professor's position in the array above), "name", "matchScore" (0-100), "tier" (1, 2, or 3), and "matchReason" (why they fit)."#;

/// Email drafting. Replace `{language}`, `{name}`, `{education}`, `{skills}`,
/// `{professor}`, `{bio}`.
pub const DRAFT_PROMPT_TEMPLATE: &str = r#"Write a professional lab inquiry email in {language}.
Student: {name} ({education}), Skills: {skills}
Recipient: Prof. {professor} (Research: {bio})

Tone: Professional, direct, and research-focused.
Format: JSON with 'subject' and 'body'."#;
