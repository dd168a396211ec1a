//! API signatures, violations, and the checking-engine interface.
//!
//! A [`SignatureSet`] is the in-memory form of a platform signature: the
//! classes and members available on a target runtime. The
//! [`SignatureEngine`] trait is the boundary to the component that actually
//! reads class files and signature files; [`MemoryEngine`] answers from
//! pre-registered tables.

#![warn(missing_docs)]

pub mod engine;
pub mod memory;
pub mod reference;
pub mod signature;
pub mod violation;

pub use engine::{CheckRequest, EngineError, SignatureEngine};
pub use memory::{MemoryEngine, Reference};
pub use reference::SignatureRef;
pub use signature::{ClassSignature, SignatureSet};
pub use violation::Violation;
