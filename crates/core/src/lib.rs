//! Core library: support-message triage and policy answering over a PDF folder.

pub mod answerer;
pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod extractor;
pub mod indexer;
pub mod models;
pub mod pacing;
pub mod pipeline;
pub mod prompts;
pub mod search;
pub mod splitter;
pub mod vectorstore;
