//! Mission agent for the Skybridge mission-control backend.
//!
//! [`MissionAgent`] drives one tool-calling turn per user command: fetch
//! the tool catalog, let the model propose, execute at most one tool, and
//! fold the outcome back through a follow-up turn. The tool server is
//! reached through the [`ToolBroker`] seam so the loop tests with mocks.

pub mod agent;
pub mod broker;
pub mod error;

pub use agent::MissionAgent;
pub use broker::ToolBroker;
pub use error::{AgentError, Result};
