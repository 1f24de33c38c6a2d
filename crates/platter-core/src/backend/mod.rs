//! Model backend adapters: one uniform call contract over a remote hosted
//! API, a locally network-served model, and an in-process template model.

pub mod builtin;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod trait_def;

pub use builtin::BuiltinBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use registry::BackendRegistry;
pub use trait_def::{BackendError, GenerateRequest, ModelBackend};
