//! Trellis Core Types and Definitions
//!
//! This crate provides the in-memory document model for Trellis class
//! diagrams. It includes:
//!
//! - **Geometry**: Integer points and sizes ([`geometry`] module)
//! - **Colors**: The named-color palette ([`color::NamedColors`])
//! - **Identifiers**: Arena keys for diagram elements ([`identifier`] module)
//! - **Elements**: Entities, inheritance nodes and relations
//! - **Diagram**: The aggregate and its integrity rules ([`diagram::Diagram`])
//! - **Copy**: Filtered, isomorphism-preserving copies ([`copy`] module)

pub mod color;
pub mod copy;
pub mod diagram;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod identifier;
pub mod inheritance;
pub mod relation;

pub use error::GraphError;
