//! HTTP gateway to an OpenAI-compatible chat-completions provider.
//!
//! Provider selection happens once, at construction: credentials are
//! probed in fixed priority order (dashscope, deepseek, openai) and the
//! first usable key wins. The resulting gateway is immutable and shared
//! read-only across requests.

pub mod gateway;

pub use gateway::{select_provider, ChatCompletionsGateway, SelectedProvider};
