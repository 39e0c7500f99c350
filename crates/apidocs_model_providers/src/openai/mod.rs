//! `OpenAI` backend over the Responses API, via `async-openai`.

mod provider;

pub use provider::OpenAiProvider;
