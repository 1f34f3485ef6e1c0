//! # docrag-gemini
//!
//! Gemini API clients behind the [`docrag_core::EmbeddingProvider`] and
//! [`docrag_core::ChatModel`] seams. Everything network-shaped lives here;
//! the pipelines never see an HTTP type.

mod chat;
mod client;
mod embed;

pub use chat::GeminiChat;
pub use client::GeminiClient;
pub use embed::GeminiEmbedder;
