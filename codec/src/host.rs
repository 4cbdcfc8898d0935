//! Host contract: where replicated state lives on each peer.

use std::collections::BTreeMap;

use schema::{EntityLayout, SerializerDef};

use crate::animator::{Animator, MemoryAnimator};

/// Game-side state an entity replicator reads and writes.
pub trait EntityHost {
    /// Returns the named flag, or `None` if the host has no such flag.
    fn flag(&self, name: &str) -> Option<bool>;

    /// Writes the named flag. Unknown names are ignored.
    fn set_flag(&mut self, name: &str, value: bool);

    fn animator(&self) -> Option<&dyn Animator>;

    fn animator_mut(&mut self) -> Option<&mut dyn Animator>;
}

/// Host backed by a flag map and an optional [`MemoryAnimator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryHost {
    flags: BTreeMap<String, bool>,
    animator: Option<MemoryAnimator>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host with every flag and parameter a layout names, all cleared.
    #[must_use]
    pub fn from_layout(layout: &EntityLayout) -> Self {
        let mut host = Self::new();
        for def in &layout.serializers {
            match def {
                SerializerDef::Flags { flags } => {
                    for flag in flags {
                        host.flags.insert(flag.name.clone(), false);
                    }
                }
                SerializerDef::AnimatorParams { params } => {
                    host.animator = Some(MemoryAnimator::from_defs(params));
                }
                SerializerDef::AnimatorState => {
                    if host.animator.is_none() {
                        host.animator = Some(MemoryAnimator::new(Vec::new()));
                    }
                }
            }
        }
        host
    }

    /// Adds a flag with an initial value.
    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_animator(mut self, animator: MemoryAnimator) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Iterates flags in name order.
    pub fn flags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(name, value)| (name.as_str(), *value))
    }

    #[must_use]
    pub const fn memory_animator(&self) -> Option<&MemoryAnimator> {
        self.animator.as_ref()
    }

    pub fn memory_animator_mut(&mut self) -> Option<&mut MemoryAnimator> {
        self.animator.as_mut()
    }
}

impl EntityHost for MemoryHost {
    fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        if let Some(slot) = self.flags.get_mut(name) {
            *slot = value;
        }
    }

    fn animator(&self) -> Option<&dyn Animator> {
        self.animator.as_ref().map(|a| a as &dyn Animator)
    }

    fn animator_mut(&mut self) -> Option<&mut dyn Animator> {
        self.animator.as_mut().map(|a| a as &mut dyn Animator)
    }
}
