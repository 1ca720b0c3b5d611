//! Core traits and types for the IndicCommerce shopping assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Adapter traits for pluggable backends (speech, translation, LLM,
//!   product search, sessions)
//! - Inbound message and outbound response types
//! - Catalog, cart and session types
//! - Language definitions
//! - Error types

pub mod error;
pub mod intent;
pub mod language;
pub mod llm_types;
pub mod message;
pub mod product;
pub mod response;
pub mod session;
pub mod traits;

pub use error::{Error, Result};
pub use intent::{CartAction, Intent};
pub use language::Language;
pub use llm_types::{FinishReason, GenerateRequest, GenerateResponse, Message, Role};
pub use message::{AudioRef, AudioSource, InboundMessage, MessageContent};
pub use product::{format_rupees, parse_rupees, Product};
pub use response::Response;
pub use session::{Cart, CartItem, CartUpdate, ConversationTurn, TurnRole, UserSession};

pub use traits::{
    LanguageModel, ProductIndex, SessionStore, SpeechSynthesizer, Transcriber, Transcript,
    Translator,
};
