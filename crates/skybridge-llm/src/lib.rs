//! Language model backends for the Skybridge mission-control backend.
//!
//! [`types`] models the Gemini `generateContent` wire format (turns,
//! parts, function calls, declarations); [`backend`] is the provider
//! seam, with [`GeminiBackend`] as the production implementation and
//! [`MockBackend`] for tests.

pub mod backend;
pub mod error;
pub mod gemini;
pub mod types;

pub use backend::{LlmBackend, MockBackend, SharedBackend};
pub use error::{LlmError, Result};
pub use gemini::{GeminiBackend, GeminiConfig, DEFAULT_MODEL};
pub use types::{
    Candidate, Content, FunctionCall, FunctionDeclaration, FunctionResponse, GenerateRequest,
    GenerateResponse, Part, Role, ToolConfig,
};
