//! VLESS link to Xray-core configuration translator.

pub mod config;
pub mod link;
pub mod persist;
pub mod systemd;

pub use config::builder::build;
pub use config::schema::ConfigDocument;
pub use link::{ConnectionDescriptor, LinkRegistry, ParseError};
pub use persist::PersistError;
