//! Entity replication layouts for the statepack replication layer.
//!
//! This crate defines what an entity replicates and in which order:
//! - Ordered serializer definitions (flags, animator parameters, animator state)
//! - Flag and animator parameter definitions, including per-field network policy
//! - Resend timing and quantization settings
//! - Deterministic layout fingerprints
//!
//! # Design Principles
//!
//! - **Order is the contract** - A serializer's position is its wire index.
//! - **Explicit layouts** - No reflection on host types.
//! - **Deterministic hashing** - The fingerprint is stable given the same definition.

mod config;
mod error;
mod field;
mod hash;
mod layout;

pub use config::SyncConfig;
pub use error::{SchemaError, SchemaResult};
pub use field::{FlagDef, ParamDef, ParamKind};
pub use hash::layout_fingerprint;
pub use layout::{EntityLayout, LayoutBuilder, SerializerDef, SerializerKind};

/// Maximum flags in one flag serializer (one byte).
pub const MAX_FLAGS: usize = 8;

/// Maximum parameters in one parameter serializer (seven-bit tag index, minus the sentinel).
pub const MAX_PARAMS: usize = 127;
