//! Protocol module for canonical request structures
//!
//! This module defines the provider-agnostic shapes callers hand to a
//! provider instance. Every adapter maps these to its own wire format:
//! - `Message` / `Attachment` for conversation turns
//! - `Prompt` for loosely shaped caller input
//! - `ResponseFormat` for the expected output schema
//! - `CallParams` for per-call options

pub mod types;

pub use types::{Attachment, CallParams, Message, MessageContent, Prompt, ResponseFormat, Role};
