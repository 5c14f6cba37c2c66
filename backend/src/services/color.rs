//! Coverage-to-colour mapping.
//!
//! A coverage value is normalised against the window maximum, eased with a
//! smoothstep, and placed into one of four gradient bands. Inside a band the
//! local position is eased again before the two bounding stops are blended.
//! The double easing keeps the ramp free of visible seams at band edges.

use serde::{Deserialize, Serialize};

/// An RGB colour with straight (non-premultiplied) alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Anchor colour of the gradient.
pub type ColorStop = Rgba;

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// CSS `rgba()` notation.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

/// Gradient stops from idle to overloaded.
///
/// The lowest stop is fully transparent so idle days show the surface
/// background instead of a tint.
pub const GRADIENT: [ColorStop; 5] = [
    Rgba::new(200, 200, 200, 0.0),
    Rgba::new(76, 175, 80, 0.55),
    Rgba::new(255, 235, 59, 0.7),
    Rgba::new(244, 67, 54, 0.85),
    Rgba::new(139, 0, 0, 1.0),
];

/// Band edges on the eased `[0, 1]` scale. Band `i` spans
/// `BAND_EDGES[i]..=BAND_EDGES[i + 1]` and blends `GRADIENT[i]` into
/// `GRADIENT[i + 1]`.
pub const BAND_EDGES: [f64; 5] = [0.0, 0.35, 0.65, 0.85, 1.0];

/// Cubic ease `t²(3 − 2t)`, clamped to `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn eased_ratio(value: u32, max_value: u32) -> f64 {
    smoothstep(f64::from(value) / f64::from(max_value))
}

fn band_for(t: f64) -> usize {
    BAND_EDGES[1..BAND_EDGES.len() - 1]
        .iter()
        .take_while(|edge| t > **edge)
        .count()
}

/// Gradient band (`0..=3`) a value falls in, or `None` for idle days.
pub fn band_index(value: u32, max_value: u32) -> Option<usize> {
    if value == 0 || max_value == 0 {
        return None;
    }
    Some(band_for(eased_ratio(value, max_value)))
}

/// Colour for a coverage `value` relative to the window's `max_value`.
///
/// Idle days and empty windows get the lowest stop.
pub fn color_for(value: u32, max_value: u32) -> Rgba {
    if value == 0 || max_value == 0 {
        return GRADIENT[0];
    }

    let t = eased_ratio(value, max_value);
    let band = band_for(t);
    let (lo, hi) = (BAND_EDGES[band], BAND_EDGES[band + 1]);
    let local = smoothstep((t - lo) / (hi - lo));

    blend(GRADIENT[band], GRADIENT[band + 1], local)
}

fn blend(from: Rgba, to: Rgba, t: f64) -> Rgba {
    Rgba {
        r: blend_channel(from.r, to.r, t),
        g: blend_channel(from.g, to.g, t),
        b: blend_channel(from.b, to.b, t),
        a: (f64::from(from.a) * (1.0 - t) + f64::from(to.a) * t) as f32,
    }
}

fn blend_channel(from: u8, to: u8, t: f64) -> u8 {
    let v = f64::from(from) * (1.0 - t) + f64::from(to) * t;
    v.round().clamp(0.0, 255.0) as u8
}

/// One swatch of the heatmap legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub value: u32,
    pub label: String,
    pub color: Rgba,
}

/// Legend swatches for a window whose busiest day has `max_value` intervals.
///
/// Samples idle, quarter, half, three-quarter and full load; duplicates that
/// appear for small maxima are collapsed.
pub fn legend(max_value: u32) -> Vec<LegendEntry> {
    let mut values: Vec<u32> = [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|f| (f * f64::from(max_value)).ceil() as u32)
        .collect();
    values.dedup();

    values
        .into_iter()
        .map(|value| LegendEntry {
            value,
            label: format!("{} processes", value),
            color: color_for(value, max_value),
        })
        .collect()
}
