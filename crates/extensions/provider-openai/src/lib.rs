//! OpenAI chat-completions backend for Message Enhancer.

mod api;
mod client;
pub mod prompt;

pub use client::OpenAIEnhancer;
pub use prompt::system_prompt;
