/// The integer axis `[1, N]` and its mapping to normalized render coordinates.
///
/// Position 1 owns `u ∈ [0, 1/N)`, position N owns `u ∈ [(N-1)/N, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSpace {
    n: u32,
}

impl IndexSpace {
    pub fn new(n: u32) -> Self {
        Self { n }
    }

    pub fn len(&self) -> u32 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// `n = floor(u * N) + 1`, clamped onto the axis
    pub fn position_at(&self, u: f32) -> u32 {
        if !(u > 0.0) {
            return 1;
        }
        let pos = ((u * self.n as f32).floor() as u32).saturating_add(1);
        pos.clamp(1, self.n.max(1))
    }

    /// Center of a position's cell in normalized coordinates
    pub fn normalized(&self, position: u32) -> f32 {
        (position as f32 - 0.5) / self.n as f32
    }

    /// Buffer slot for a position; position 1 lands at index 0
    pub fn slot(&self, position: u32) -> Option<usize> {
        if position >= 1 && position <= self.n {
            Some((position - 1) as usize)
        } else {
            None
        }
    }
}
