//! Core types and error definitions for the Delegor runtime.
//!
//! This crate provides the foundational types shared across all Delegor
//! crates: the message envelope and addressing model, reference-code
//! generation, the authority-tier model, and error handling.
//!
//! # Main types
//!
//! - [`DelegorError`] — Unified error enum for all Delegor subsystems.
//! - [`DelegorResult`] — Convenience alias for `Result<T, DelegorError>`.
//! - [`Message`] / [`MessagePayload`] — The opaque payload exchanged between agents.
//! - [`MessageEnvelope`] / [`MessageContext`] — The immutable per-hop wrapper.
//! - [`ReferenceCode`] / [`ReferenceCodeGenerator`] — Day-scoped tracking tokens.
//! - [`AuthorityTier`] / [`AuthorityClaim`] — The per-hop delegation mandate.

/// Authority tiers and per-hop claims.
pub mod authority;
/// Decomposition output consumed by the routing state machine.
pub mod decomposition;
/// Error types.
pub mod error;
/// The immutable message envelope and its routing context.
pub mod envelope;
/// Message and payload types.
pub mod message;
/// Reference-code tokens and their generator.
pub mod refcode;

pub use authority::{max_claim_tier, AuthorityClaim, AuthorityTier};
pub use decomposition::{DecompositionResult, DecompositionTask};
pub use envelope::{MessageContext, MessageEnvelope};
pub use error::{DelegorError, DelegorResult};
pub use message::{Message, MessagePayload};
pub use refcode::{ReferenceCode, ReferenceCodeGenerator};
