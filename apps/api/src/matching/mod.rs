// The AI gateway: CV parsing, faculty discovery, match scoring, drafting.
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod cv_parser;
pub mod discovery;
pub mod drafting;
pub mod gateway;
pub mod prompts;
pub mod scoring;
