//! quillpad - terminal client for a hosted personal-notes service.
//!
//! Storage and auth are delegated to a hosted backend ([`backend`]); AI text
//! transforms to a hosted model ([`assist`]). The piece with real behavior
//! is [`notebook`]: the client-side note lifecycle - optimistic local
//! mutation, debounced persistence, vacant-note garbage collection, and
//! per-operation failure policy.

pub mod assist;
pub mod backend;
pub mod config;
pub mod models;
pub mod notebook;
pub mod ui;
