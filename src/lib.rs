//! gitquill — generates conventional-commit messages from staged diffs by
//! calling a configurable LLM provider and normalizing whatever comes back.
//!
//! The pipeline: a [`coordinator::Coordinator`] guarantees at most one
//! network operation in flight, a per-vendor adapter in [`providers`] turns
//! (credential, model, prompt) into raw text, and [`normalize`] flattens
//! that text into a deterministic [`message::CommitMessage`]. The two entry
//! points hosts call are [`facade::Generator::generate`] and
//! [`facade::Generator::validate`].

pub mod config;
pub mod coordinator;
pub mod error;
pub mod facade;
pub mod message;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod validate;

pub use error::GenError;
pub use facade::Generator;
pub use message::{CommitMessage, GenerationRequest, ProviderId, ValidationResult};
