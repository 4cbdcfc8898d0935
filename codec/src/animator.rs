//! Animator contract and an in-memory implementation.

use schema::{ParamDef, ParamKind};

/// One entry of an animator's parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimatorParameter {
    pub name: String,
    pub kind: ParamKind,
}

impl AnimatorParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Coarse playback state of an animator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimatorStateInfo {
    /// Hash of the current state's name.
    pub state_hash: i32,
    /// Playback position within the state, `0.0..=1.0` for one loop.
    pub normalized_time: f32,
}

/// A host animator addressed by parameter index.
///
/// Indices follow [`Animator::parameters`]. Out-of-range indices read as
/// default values and writes to them are ignored; replicators check the
/// parameter list against the layout before touching any index.
pub trait Animator {
    /// Ordered parameter list; fixed for the animator's lifetime.
    fn parameters(&self) -> &[AnimatorParameter];

    /// Returns `true` while the trigger at `index` is set.
    fn trigger(&self, index: usize) -> bool;

    fn bool_value(&self, index: usize) -> bool;

    fn int_value(&self, index: usize) -> i32;

    fn float_value(&self, index: usize) -> f32;

    fn set_trigger(&mut self, index: usize);

    fn set_bool(&mut self, index: usize, value: bool);

    fn set_int(&mut self, index: usize, value: i32);

    fn set_float(&mut self, index: usize, value: f32);

    fn current_state(&self) -> AnimatorStateInfo;

    /// Seeks to `state_hash` at `normalized_time`.
    fn play(&mut self, state_hash: i32, normalized_time: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Trigger(bool),
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl Slot {
    const fn for_kind(kind: ParamKind) -> Self {
        match kind {
            ParamKind::Trigger => Self::Trigger(false),
            ParamKind::Bool => Self::Bool(false),
            ParamKind::Int => Self::Int(0),
            ParamKind::Float => Self::Float(0.0),
        }
    }
}

/// Animator backed by plain memory.
///
/// Used by headless peers, tests, and the simulation tools. Triggers stay
/// set until [`MemoryAnimator::reset_trigger`] consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryAnimator {
    parameters: Vec<AnimatorParameter>,
    slots: Vec<Slot>,
    state: AnimatorStateInfo,
}

impl MemoryAnimator {
    /// Creates an animator with every parameter at its default value.
    #[must_use]
    pub fn new(parameters: Vec<AnimatorParameter>) -> Self {
        let slots = parameters.iter().map(|p| Slot::for_kind(p.kind)).collect();
        Self {
            parameters,
            slots,
            state: AnimatorStateInfo::default(),
        }
    }

    /// Creates an animator whose parameter list matches layout definitions.
    #[must_use]
    pub fn from_defs(defs: &[ParamDef]) -> Self {
        Self::new(
            defs.iter()
                .map(|d| AnimatorParameter::new(d.name.clone(), d.kind))
                .collect(),
        )
    }

    /// Looks up a parameter index by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    /// Clears a set trigger, as a state transition consuming it would.
    pub fn reset_trigger(&mut self, index: usize) {
        if let Some(Slot::Trigger(set)) = self.slots.get_mut(index) {
            *set = false;
        }
    }

    /// Sets the playback state without going through `play`.
    pub fn set_state(&mut self, state: AnimatorStateInfo) {
        self.state = state;
    }
}

impl Animator for MemoryAnimator {
    fn parameters(&self) -> &[AnimatorParameter] {
        &self.parameters
    }

    fn trigger(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Trigger(true)))
    }

    fn bool_value(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Bool(true)))
    }

    fn int_value(&self, index: usize) -> i32 {
        match self.slots.get(index) {
            Some(Slot::Int(v)) => *v,
            _ => 0,
        }
    }

    fn float_value(&self, index: usize) -> f32 {
        match self.slots.get(index) {
            Some(Slot::Float(v)) => *v,
            _ => 0.0,
        }
    }

    fn set_trigger(&mut self, index: usize) {
        if let Some(Slot::Trigger(set)) = self.slots.get_mut(index) {
            *set = true;
        }
    }

    fn set_bool(&mut self, index: usize, value: bool) {
        if let Some(Slot::Bool(v)) = self.slots.get_mut(index) {
            *v = value;
        }
    }

    fn set_int(&mut self, index: usize, value: i32) {
        if let Some(Slot::Int(v)) = self.slots.get_mut(index) {
            *v = value;
        }
    }

    fn set_float(&mut self, index: usize, value: f32) {
        if let Some(Slot::Float(v)) = self.slots.get_mut(index) {
            *v = value;
        }
    }

    fn current_state(&self) -> AnimatorStateInfo {
        self.state
    }

    fn play(&mut self, state_hash: i32, normalized_time: f32) {
        self.state = AnimatorStateInfo {
            state_hash,
            normalized_time,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator() -> MemoryAnimator {
        MemoryAnimator::new(vec![
            AnimatorParameter::new("jump", ParamKind::Trigger),
            AnimatorParameter::new("on_ground", ParamKind::Bool),
            AnimatorParameter::new("combo", ParamKind::Int),
            AnimatorParameter::new("speed", ParamKind::Float),
        ])
    }

    #[test]
    fn defaults() {
        let a = animator();
        assert!(!a.trigger(0));
        assert!(!a.bool_value(1));
        assert_eq!(a.int_value(2), 0);
        assert_eq!(a.float_value(3), 0.0);
        assert_eq!(a.current_state(), AnimatorStateInfo::default());
    }

    #[test]
    fn setters_respect_kind() {
        let mut a = animator();
        a.set_bool(0, true);
        assert!(!a.trigger(0));
        a.set_float(2, 1.5);
        assert_eq!(a.int_value(2), 0);
        a.set_int(2, 3);
        a.set_float(3, 1.5);
        assert_eq!(a.int_value(2), 3);
        assert_eq!(a.float_value(3), 1.5);
    }

    #[test]
    fn trigger_stays_set_until_reset() {
        let mut a = animator();
        a.set_trigger(0);
        assert!(a.trigger(0));
        assert!(a.trigger(0));
        a.reset_trigger(0);
        assert!(!a.trigger(0));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut a = animator();
        a.set_bool(99, true);
        assert!(!a.bool_value(99));
    }

    #[test]
    fn play_sets_state() {
        let mut a = animator();
        a.play(-17, 0.25);
        assert_eq!(a.current_state().state_hash, -17);
        assert_eq!(a.current_state().normalized_time, 0.25);
    }

    #[test]
    fn from_defs_and_lookup() {
        let a = MemoryAnimator::from_defs(&[
            ParamDef::new("a", ParamKind::Bool),
            ParamDef::new("b", ParamKind::Float).ignored(),
        ]);
        assert_eq!(a.parameters().len(), 2);
        assert_eq!(a.index_of("b"), Some(1));
        assert_eq!(a.index_of("c"), None);
    }
}
