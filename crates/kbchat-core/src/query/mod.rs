//! Query orchestration
//!
//! Turns a question plus optional conversation history into a
//! retrieve-and-generate request, resolves the generation model with bounded
//! fallback, and normalizes the provider's answer.

mod classifier;
mod enhancer;
mod model_id;
mod orchestrator;
pub mod prompts;
mod request;
mod response;
pub mod validation;

pub use classifier::{classify, QueryType};
pub use enhancer::{enhance, recent_history, ConversationExchange, ANSWER_PREVIEW_CHARS};
pub use model_id::{ModelIdentifier, ModelResolver, ResolutionPlan, ResolutionState};
pub use orchestrator::{QueryEngine, QueryRequest, MISSING_SESSION_ID};
pub use request::{
    GenerationConfiguration, KnowledgeBaseConfiguration, RequestBuilder,
    RetrieveAndGenerateConfiguration, RetrieveAndGenerateRequest, NUMBER_OF_RESULTS,
};
pub use response::{
    normalize, Citation, QueryResult, RetrieveAndGenerateResponse, RetrievedReference, Source,
    NO_ANSWER_PLACEHOLDER,
};
