//! Host-list extraction.
//!
//! # Data Flow
//! ```text
//! live Caddyfile text
//!     → parser.rs (strip comments, track brace depth, classify tokens)
//!     → Vec<HostEntry> (deduplicated, first-seen order)
//!     → generate_content → {"links": [{name, url}, ...]}
//! ```
//!
//! # Design Decisions
//! - Heuristic, not a Caddyfile grammar: unknown tokens are skipped, never
//!   reported as errors
//! - Read-only: the parser has no write path into either document

pub mod parser;

use serde_json::{json, Value};

pub use parser::{extract_hosts, HostEntry};

/// Landing-page content generated from a Caddyfile.
pub fn generate_content(caddyfile: &str) -> Value {
    let links = extract_hosts(caddyfile);
    json!({ "links": links })
}
