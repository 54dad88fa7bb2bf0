//! Per-pixel render field.
//!
//! Recomputes the continuous wave picture straight from the primes, spawn
//! stagger and speed, independently of the crossing state, then composites it
//! with the persisted crossing value for the pixel's position. The WGSL shader
//! in `shaders/sieve.wgsl` evaluates the same formula on the GPU.

use std::f32::consts::TAU;

use crate::config::{
    CROSSED_ALPHA, CROSSED_COLOR, HEIGHT_GAIN, HIGHLIGHT_ALPHA, HIGHLIGHT_COLOR,
    HIGHLIGHT_EPSILON, PULSE_DECAY, RAMP_HIGH, RAMP_LOW,
};
use crate::sieve::IndexSpace;

/// Linear RGBA, each channel in [0, 1]
pub type Rgba = [f32; 4];

/// Everything the field needs besides `t` and the encoded crossings
#[derive(Clone, Debug, PartialEq)]
pub struct FieldParams<'a> {
    pub n: u32,
    pub primes: &'a [u32],
    pub step: f32,
    pub speed: f32,
    pub decay: f32,
    pub highlight_epsilon: f32,
}

impl<'a> FieldParams<'a> {
    pub fn new(n: u32, primes: &'a [u32], step: f32, speed: f32) -> Self {
        Self {
            n,
            primes,
            step,
            speed,
            decay: PULSE_DECAY,
            highlight_epsilon: HIGHLIGHT_EPSILON,
        }
    }
}

/// Summed wave height and strongest transient highlight at one position
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldSample {
    pub height: f32,
    pub highlight: f32,
}

/// Evaluate every spawned wavefront at integer position `n`
pub fn sample(n: u32, t: f32, params: &FieldParams<'_>) -> FieldSample {
    let x = n as f32;
    let mut out = FieldSample::default();

    for (rank, &p) in params.primes.iter().enumerate() {
        let spawn = rank as f32 * params.step;
        // Primes spawn in rank order, so nothing later is active either.
        if t < spawn {
            break;
        }
        let dt = t - spawn;
        let front = (params.speed * dt).round();
        let dist = x - front;
        let pulse = (-params.decay * dist * dist).exp();

        let pf = p as f32;
        let wave = pulse * (TAU * x / pf - params.speed * dt).sin() / pf.max(1.0).sqrt();
        out.height += wave;

        let r = x % pf;
        if r < params.highlight_epsilon || pf - r < params.highlight_epsilon {
            out.highlight = out.highlight.max(pulse);
        }
    }

    out
}

/// Base ramp: left-to-right gradient with a soft vertical falloff
pub fn base_color(u: f32, v: f32) -> [f32; 3] {
    let u = u.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let shade = 0.6 + 0.4 * (1.0 - (2.0 * v - 1.0).abs());
    let mut c = mix3(RAMP_LOW, RAMP_HIGH, u);
    for ch in &mut c {
        *ch *= shade;
    }
    c
}

/// Shade one pixel.
///
/// `crossed` is the encoded buffer; a missing slot reads as uncrossed.
pub fn render_pixel(u: f32, v: f32, t: f32, params: &FieldParams<'_>, crossed: &[f32]) -> Rgba {
    let space = IndexSpace::new(params.n);
    let n = space.position_at(u);
    let s = sample(n, t, params);

    let base = base_color(u, v);
    let gain = 1.0 + HEIGHT_GAIN * s.height;
    let lit = base.map(|ch| (ch * gain).clamp(0.0, 1.0));

    let persisted = space
        .slot(n)
        .and_then(|slot| crossed.get(slot))
        .copied()
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let c = mix3(lit, CROSSED_COLOR, persisted * CROSSED_ALPHA);
    let c = mix3(c, HIGHLIGHT_COLOR, s.highlight.clamp(0.0, 1.0) * HIGHLIGHT_ALPHA);

    [c[0], c[1], c[2], 1.0]
}

fn mix3(a: [f32; 3], b: [f32; 3], w: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * w,
        a[1] + (b[1] - a[1]) * w,
        a[2] + (b[2] - a[2]) * w,
    ]
}
