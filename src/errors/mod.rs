//! Error types for project export and import
//!
//! One structured error enum covers the whole portability pipeline: archive
//! packing, metadata parsing, identifier remapping, and artifact uploads.
//!
//! # Examples
//!
//! ```rust
//! use modelbench::errors::PortabilityError;
//!
//! // A destination already holds the proposed project key
//! let err = PortabilityError::KeyConflict("fraud_model".to_string());
//! assert!(err.is_recoverable());
//!
//! // An archive references an entity it does not contain
//! use modelbench::domain::EntityKind;
//! let err = PortabilityError::ReferentialIntegrity {
//!     kind: EntityKind::Dataset,
//!     source_id: 42,
//! };
//! assert!(!err.is_recoverable());
//! ```

pub mod portability;

pub use portability::PortabilityError;

/// Result type alias for portability operations
pub type PortabilityResult<T> = Result<T, PortabilityError>;
