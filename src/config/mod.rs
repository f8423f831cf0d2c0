//! Configuration document subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectionDescriptor + socks port
//!     → builder.rs (fixed management sections + derived proxy sections)
//!     → ConfigDocument (typed, immutable)
//!     → persist subsystem (canonical JSON on disk)
//! ```
//!
//! # Design Decisions
//! - The document is a pure tree: built once per invocation, never mutated
//! - Protocol-variable sections (inbound settings, outbound settings,
//!   routing rules) are typed variants keyed by their discriminant; only
//!   the stats placeholder stays a generic map
//! - Engine-variant literals live in builder.rs as named constants

pub mod builder;
pub mod schema;

pub use builder::build;
pub use schema::ConfigDocument;
