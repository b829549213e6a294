//! Deterministic 1-D value noise.

/// Pseudo-random value in `[-1, 1]` for an integer lattice point (splitmix64 finaliser).
fn lattice(i: i64) -> f64 {
    let mut x = (i as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    (x >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
}

/// Lattice values at both ends of the cell holding `x`, and the offset into it. Cells
/// past the `i64` range saturate and wrap to a neighbour.
fn cell(x: f64) -> (f64, f64, f64) {
    let floor = x.floor();
    let i = floor as i64;
    (lattice(i), lattice(i.wrapping_add(1)), x - floor)
}

fn smoothstep(f: f64) -> f64 {
    f * f * (3.0 - 2.0 * f)
}

/// Smoothly interpolated lattice noise. Returns the lattice value at integers and stays
/// within `[-1, 1]`.
pub fn value_noise(x: f64) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    let (a, b, f) = cell(x);
    a + (b - a) * smoothstep(f)
}

/// Analytic derivative of [`value_noise`].
pub fn value_noise_derivative(x: f64) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    let (a, b, f) = cell(x);
    (b - a) * 6.0 * f * (1.0 - f)
}
