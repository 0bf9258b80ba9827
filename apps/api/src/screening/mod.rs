// Screening: JD/CV keyword extraction, ATS match scoring and JD bias auditing.
// All LLM calls go through llm_client; no direct backend calls here.

pub mod analysis;
pub mod bias;
pub mod handlers;
pub mod keywords;
pub mod normalizer;
pub mod prompts;
pub mod scoring;
