//! Wardline — a chat gateway for patient directories.
//!
//! Free-text requests come in over HTTP or WebSocket, a deterministic
//! rule table routes them to structured tool calls, an alias-driven
//! normalizer canonicalizes whatever JSON the upstream directory
//! returns, and a presenter renders the result back as stable text.

pub mod api; // HTTP + WebSocket surface
pub mod assistant; // Orchestrator: route → fetch → normalize → present
pub mod config;
pub mod directory; // Upstream patient-directory client
pub mod envelope; // Response unwrapping (shape detectors)
pub mod fields; // Canonical fields + alias resolution
pub mod intent; // Free-text intent routing
pub mod normalize; // unwrap → resolve → filter → truncate
pub mod presenter; // Text rendering
pub mod session; // Bounded in-memory conversation history
pub mod tools; // Tool catalog + dispatch
