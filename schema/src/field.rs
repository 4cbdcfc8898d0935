//! Flag and animator parameter definitions.

/// A boolean carried by a flag serializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagDef {
    /// Name the host uses to look the flag up.
    pub name: String,
    /// Whether a received value is written to the host.
    ///
    /// Flags that the receiving peer simulates itself (death, for one) are
    /// sent for completeness but never applied from the network.
    #[cfg_attr(feature = "serde", serde(default = "default_apply_remote"))]
    pub apply_remote: bool,
}

#[cfg(feature = "serde")]
const fn default_apply_remote() -> bool {
    true
}

impl FlagDef {
    /// Creates a flag that remote peers apply.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apply_remote: true,
        }
    }

    /// Creates a flag that remote peers receive but keep locally simulated.
    #[must_use]
    pub fn local_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apply_remote: false,
        }
    }
}

/// Type of an animator parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParamKind {
    /// One-shot; reported once per firing.
    Trigger,
    /// Two-state; reported with its value in the tag's high bit.
    Bool,
    /// Integer; quantized like a float.
    Int,
    /// Float; quantized to 16 bits over the layout's numeric range.
    Float,
}

impl ParamKind {
    /// Returns `true` for kinds carried as a quantized `u16`.
    #[must_use]
    pub const fn is_number(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

/// An animator parameter at a fixed index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamDef {
    pub name: String,
    pub kind: ParamKind,
    /// Ignored parameters keep their index but are never sent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ignored: bool,
}

impl ParamDef {
    /// Creates a replicated parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ignored: false,
        }
    }

    /// Marks the parameter as excluded from replication.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_constructors() {
        assert!(FlagDef::new("facing_left").apply_remote);
        assert!(!FlagDef::local_only("dead").apply_remote);
    }

    #[test]
    fn param_kinds() {
        assert!(ParamKind::Float.is_number());
        assert!(ParamKind::Int.is_number());
        assert!(!ParamKind::Bool.is_number());
        assert!(!ParamKind::Trigger.is_number());
        assert_eq!(ParamKind::Trigger.as_str(), "trigger");
    }

    #[test]
    fn param_ignored_builder() {
        let param = ParamDef::new("debug", ParamKind::Bool).ignored();
        assert!(param.ignored);
        assert_eq!(param.kind, ParamKind::Bool);
    }
}
