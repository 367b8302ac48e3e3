//! # aas-base
//!
//! Core library for the Asset Administration Shell (AAS) metamodel:
//! an owned object graph, reference resolution, JSON and XML codecs,
//! and storage adapters.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! compliance      → step reports over serialized files
//!   ↓
//! backend         → object stores with optimistic concurrency
//!   ↓
//! interchange     → JSON / XML codecs
//!   ↓
//! validation      → metamodel invariants over a whole graph
//! resolve         → model references → nodes
//! identification  → identifier generators
//!   ↓
//! model           → shells, submodels, elements, typed values
//! ```

// ============================================================================
// MODULES (dependency order: model → resolve/validation → interchange → backend)
// ============================================================================

/// Metamodel: identifiables, submodel elements, references, typed values
pub mod model;

/// Reference resolution against a namespace of identifiables
pub mod resolve;

/// Cross-cutting metamodel invariants
pub mod validation;

/// Identifier generation
pub mod identification;

/// Interchange formats: JSON, XML
pub mod interchange;

/// Storage adapters: in-memory, filesystem
pub mod backend;

/// Compliance checks over serialized files
pub mod compliance;

// Re-export commonly needed items
pub use model::{Environment, Identifiable, IdentifiableRef, Identifier, Reference, SubmodelElement};
pub use resolve::{Namespace, Resolved, resolve};
