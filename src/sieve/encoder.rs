use crate::sieve::crossing::CrossingState;

/// Per-frame snapshot of the crossing flags in the layout the shader reads:
/// one `f32` per position, position 1 at index 0, `1.0` = crossed.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedBuffer {
    values: Vec<f32>,
}

impl EncodedBuffer {
    pub fn new(n: u32) -> Self {
        Self {
            values: vec![0.0; n as usize],
        }
    }

    /// Build a fresh buffer from the crossing state
    pub fn encode(state: &CrossingState) -> Self {
        let mut buffer = Self::new(state.len() as u32);
        buffer.refresh(state);
        buffer
    }

    /// Overwrite in place, reusing the allocation
    pub fn refresh(&mut self, state: &CrossingState) {
        self.values.resize(state.len(), 0.0);
        for (value, &crossed) in self.values.iter_mut().zip(state.flags()) {
            *value = if crossed { 1.0 } else { 0.0 };
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
