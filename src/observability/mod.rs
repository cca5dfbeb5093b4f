//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (kind, backup, state)
//!     → request spans from tower-http TraceLayer, tagged with x-request-id
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every admin request

pub mod logging;

pub use logging::init_tracing;
