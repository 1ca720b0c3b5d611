//! Adapter traits consumed by the shopping pipeline
//!
//! Every external capability sits behind one of these traits so backends
//! can be swapped by configuration and replaced with mocks in tests.
//!
//! ```text
//! Speech:
//!   - Transcriber: voice note → English text + detected language
//!   - SpeechSynthesizer: text → audio reference
//!
//! Text:
//!   - Translator: text between Indian languages
//!
//! Language models:
//!   - LanguageModel: free-text generation and JSON classification
//!
//! Catalog:
//!   - ProductIndex: ranked product search
//!
//! Sessions:
//!   - SessionStore: language preference, history, cart
//! ```

mod catalog;
mod llm;
mod session;
mod speech;
mod translate;

pub use catalog::ProductIndex;
pub use llm::LanguageModel;
pub use session::SessionStore;
pub use speech::{SpeechSynthesizer, Transcriber, Transcript};
pub use translate::Translator;
