//! Pie chart layout: wedge fractions and cumulative start angles.

use rand::Rng;

/// One pie wedge. Angles are in degrees, 0° at the start, decreasing clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    /// Position of the wedge in the input, used to pick its color.
    pub color_slot: usize,
    pub fraction: f64,
    pub start_angle_deg: f64,
}

impl Wedge {
    /// Signed sweep of this wedge (negative = clockwise).
    pub fn sweep_deg(&self) -> f64 {
        -self.fraction * 360.0
    }

    pub fn end_angle_deg(&self) -> f64 {
        self.start_angle_deg + self.sweep_deg()
    }
}

/// Lay out wedges for `weights`.
///
/// A total that is zero, negative or not finite yields zero-size wedges all
/// starting at 0° instead of NaN fractions.
pub fn layout(weights: &[f64]) -> Vec<Wedge> {
    let total: f64 = weights.iter().sum();
    let usable = total.is_finite() && total > 0.0;

    let mut angle = 0.0;
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let fraction = if usable { w / total } else { 0.0 };
            let wedge = Wedge {
                color_slot: i,
                fraction,
                start_angle_deg: angle,
            };
            angle -= fraction * 360.0;
            wedge
        })
        .collect()
}

/// Uniform random RGB, one per wedge.
pub fn random_colors(count: usize) -> Vec<[u8; 3]> {
    let mut rng = rand::rng();
    (0..count).map(|_| rng.random::<[u8; 3]>()).collect()
}
