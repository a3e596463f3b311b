//! The ordered LUT stack. Index 0 is the bottom layer.

use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;
use crate::lut::LutRef;

/// Maximum layer opacity, in percent.
pub const MAX_OPACITY: f32 = 100.0;

/// One look placed on the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedLut {
    /// Stable id, unique within the owning stack.
    pub id: u64,
    pub lut: LutRef,
    /// Layer opacity in percent, `0..=100`.
    pub opacity: f32,
    pub enabled: bool,
    pub blend_mode: BlendMode,
}

impl StackedLut {
    /// Whether this layer contributes to the reduced grade at all.
    pub fn participates(&self) -> bool {
        self.enabled && self.opacity > 0.0
    }

    /// Opacity as a `[0, 1]` interpolation weight.
    pub fn weight(&self) -> f32 {
        self.opacity.clamp(0.0, MAX_OPACITY) / MAX_OPACITY
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StackError {
    #[error("no stack entry with id {0}")]
    UnknownEntry(u64),
}

/// Ordered list of looks, composited bottom to top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LutStack {
    entries: Vec<StackedLut>,
    next_id: u64,
}

impl LutStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in compositing order (bottom first).
    pub fn entries(&self) -> &[StackedLut] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a look on top of the stack at full opacity. Returns its id.
    pub fn push(&mut self, lut: LutRef, blend_mode: BlendMode) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(StackedLut {
            id,
            lut,
            opacity: MAX_OPACITY,
            enabled: true,
            blend_mode,
        });
        id
    }

    pub fn get(&self, id: u64) -> Option<&StackedLut> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn remove(&mut self, id: u64) -> Result<StackedLut, StackError> {
        let idx = self.index_of(id)?;
        Ok(self.entries.remove(idx))
    }

    /// Move an entry to `index`, clamped to the top of the stack.
    pub fn move_to(&mut self, id: u64, index: usize) -> Result<(), StackError> {
        let from = self.index_of(id)?;
        let entry = self.entries.remove(from);
        let to = index.min(self.entries.len());
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Set layer opacity, clamped to `0..=100`. Non-finite input becomes 0.
    pub fn set_opacity(&mut self, id: u64, opacity: f32) -> Result<(), StackError> {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, MAX_OPACITY)
        } else {
            0.0
        };
        self.entry_mut(id)?.opacity = opacity;
        Ok(())
    }

    pub fn set_blend_mode(&mut self, id: u64, mode: BlendMode) -> Result<(), StackError> {
        self.entry_mut(id)?.blend_mode = mode;
        Ok(())
    }

    pub fn set_enabled(&mut self, id: u64, enabled: bool) -> Result<(), StackError> {
        self.entry_mut(id)?.enabled = enabled;
        Ok(())
    }

    /// Drop every entry. Ids keep counting up so stale handles never alias.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn index_of(&self, id: u64) -> Result<usize, StackError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(StackError::UnknownEntry(id))
    }

    fn entry_mut(&mut self, id: u64) -> Result<&mut StackedLut, StackError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StackError::UnknownEntry(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(stack: &LutStack) -> Vec<u64> {
        stack.entries().iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_push_assigns_increasing_ids() {
        let mut stack = LutStack::new();
        let a = stack.push(LutRef::from("warm-film"), BlendMode::Normal);
        let b = stack.push(LutRef::from("teal-orange"), BlendMode::Overlay);
        assert_eq!((a, b), (0, 1));
        assert_eq!(stack.get(b).unwrap().opacity, MAX_OPACITY);
        assert!(stack.get(b).unwrap().enabled);
    }

    #[test]
    fn test_move_to_reorders() {
        let mut stack = LutStack::new();
        let a = stack.push(LutRef::from("a"), BlendMode::Normal);
        let b = stack.push(LutRef::from("b"), BlendMode::Normal);
        let c = stack.push(LutRef::from("c"), BlendMode::Normal);
        stack.move_to(c, 0).unwrap();
        assert_eq!(ids(&stack), vec![c, a, b]);
        stack.move_to(c, 99).unwrap();
        assert_eq!(ids(&stack), vec![a, b, c]);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let mut stack = LutStack::new();
        let a = stack.push(LutRef::from("a"), BlendMode::Normal);
        stack.set_opacity(a, 140.0).unwrap();
        assert_eq!(stack.get(a).unwrap().opacity, 100.0);
        stack.set_opacity(a, f32::NAN).unwrap();
        assert_eq!(stack.get(a).unwrap().opacity, 0.0);
        assert!(!stack.get(a).unwrap().participates());
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let mut stack = LutStack::new();
        assert_eq!(stack.remove(7), Err(StackError::UnknownEntry(7)));
        assert_eq!(
            stack.set_blend_mode(7, BlendMode::Screen),
            Err(StackError::UnknownEntry(7))
        );
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut stack = LutStack::new();
        stack.push(LutRef::from("a"), BlendMode::Normal);
        stack.clear();
        assert!(stack.is_empty());
        let next = stack.push(LutRef::from("b"), BlendMode::Normal);
        assert_eq!(next, 1);
    }
}
