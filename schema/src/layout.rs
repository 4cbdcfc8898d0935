//! Entity layouts and validation.

use std::collections::HashSet;

use crate::config::SyncConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::field::{FlagDef, ParamDef};
use crate::{MAX_FLAGS, MAX_PARAMS};

/// Which serializer a definition builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SerializerKind {
    Flags,
    AnimatorParams,
    AnimatorState,
}

impl SerializerKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flags => "flags",
            Self::AnimatorParams => "animator_params",
            Self::AnimatorState => "animator_state",
        }
    }
}

/// One serializer slot of an entity layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum SerializerDef {
    /// Up to eight host flags packed into one byte.
    Flags { flags: Vec<FlagDef> },
    /// The animator's parameter list, in animator order.
    AnimatorParams { params: Vec<ParamDef> },
    /// Coarse animator state hash + normalized time.
    AnimatorState,
}

impl SerializerDef {
    /// Returns the serializer kind.
    #[must_use]
    pub const fn kind(&self) -> SerializerKind {
        match self {
            Self::Flags { .. } => SerializerKind::Flags,
            Self::AnimatorParams { .. } => SerializerKind::AnimatorParams,
            Self::AnimatorState => SerializerKind::AnimatorState,
        }
    }

    /// Returns `true` if the serializer reads or writes the host animator.
    #[must_use]
    pub const fn needs_animator(&self) -> bool {
        matches!(self, Self::AnimatorParams { .. } | Self::AnimatorState)
    }
}

/// Ordered serializer registrations for one entity template.
///
/// The position of a definition is its serializer index on the wire, so
/// every peer must build its replicators from the same layout.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityLayout {
    pub name: String,
    pub serializers: Vec<SerializerDef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sync: SyncConfig,
}

impl EntityLayout {
    /// Creates a layout after validation.
    pub fn new(
        name: impl Into<String>,
        serializers: Vec<SerializerDef>,
        sync: SyncConfig,
    ) -> SchemaResult<Self> {
        let layout = Self {
            name: name.into(),
            serializers,
            sync,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Creates a layout builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LayoutBuilder {
        LayoutBuilder {
            name: name.into(),
            serializers: Vec::new(),
            sync: SyncConfig::default(),
        }
    }

    /// Returns `true` if any serializer needs a host animator.
    #[must_use]
    pub fn needs_animator(&self) -> bool {
        self.serializers.iter().any(SerializerDef::needs_animator)
    }

    /// Validates layout invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        self.sync.validate()?;
        for (serializer, def) in self.serializers.iter().enumerate() {
            match def {
                SerializerDef::Flags { flags } => validate_flags(serializer, flags)?,
                SerializerDef::AnimatorParams { params } => validate_params(serializer, params)?,
                SerializerDef::AnimatorState => {}
            }
        }
        Ok(())
    }
}

/// Builder for `EntityLayout`.
#[derive(Debug)]
pub struct LayoutBuilder {
    name: String,
    serializers: Vec<SerializerDef>,
    sync: SyncConfig,
}

impl LayoutBuilder {
    /// Appends a flag serializer.
    #[must_use]
    pub fn flags(mut self, flags: Vec<FlagDef>) -> Self {
        self.serializers.push(SerializerDef::Flags { flags });
        self
    }

    /// Appends an animator parameter serializer.
    #[must_use]
    pub fn animator_params(mut self, params: Vec<ParamDef>) -> Self {
        self.serializers.push(SerializerDef::AnimatorParams { params });
        self
    }

    /// Appends an animator state serializer.
    #[must_use]
    pub fn animator_state(mut self) -> Self {
        self.serializers.push(SerializerDef::AnimatorState);
        self
    }

    /// Replaces the sync configuration.
    #[must_use]
    pub const fn sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Builds the layout after validation.
    pub fn build(self) -> SchemaResult<EntityLayout> {
        EntityLayout::new(self.name, self.serializers, self.sync)
    }
}

fn validate_flags(serializer: usize, flags: &[FlagDef]) -> SchemaResult<()> {
    if flags.is_empty() {
        return Err(SchemaError::EmptyFlags { serializer });
    }
    if flags.len() > MAX_FLAGS {
        return Err(SchemaError::TooManyFlags {
            serializer,
            count: flags.len(),
        });
    }
    let mut names = HashSet::new();
    for flag in flags {
        if !names.insert(flag.name.as_str()) {
            return Err(SchemaError::DuplicateFlagName {
                serializer,
                name: flag.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_params(serializer: usize, params: &[ParamDef]) -> SchemaResult<()> {
    if params.len() > MAX_PARAMS {
        return Err(SchemaError::TooManyParams {
            serializer,
            count: params.len(),
        });
    }
    let mut names = HashSet::new();
    for param in params {
        if !names.insert(param.name.as_str()) {
            return Err(SchemaError::DuplicateParamName {
                serializer,
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}
