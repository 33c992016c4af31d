//! Narrative layer: prompt templates as data, the chat-completion wire format,
//! and a single-shot HTTP client for the text-generation service.

pub mod http;
pub mod request;
pub mod service;
pub mod template;

pub use http::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, NarrativeClient, NarrativeConfig,
    NarrativeError,
};
pub use request::{ChatMessage, NarrativeRequest};
pub use service::{NarrativeService, request_narrative};
pub use template::{InputStyle, PromptContext, PromptTemplate, Segment, Slot};
