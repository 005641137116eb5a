//! Stationarity-constraining parameter transform
//!
//! Maps any real vector onto the coefficients of a stationary autoregressive
//! operator `1 - c1 B - ... - cn B^n`. Each unconstrained value becomes a
//! partial autocorrelation in `(-1, 1)` and the Durbin-Levinson recursion
//! turns those into operator coefficients, so an unconstrained optimiser can
//! search freely without ever leaving the stationary region.
//!
//! Negating the result gives an invertible moving-average operator
//! `1 + c1 B + ... + cn B^n`.

/// Constrain `unconstrained` to stationary autoregressive coefficients.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let n = unconstrained.len();
    if n == 0 {
        return Vec::new();
    }

    let partials: Vec<f64> = unconstrained
        .iter()
        .map(|&u| u / (1.0 + u * u).sqrt())
        .collect();

    let mut previous: Vec<f64> = Vec::with_capacity(n);
    for (k, &r) in partials.iter().enumerate() {
        let mut current = Vec::with_capacity(k + 1);
        for i in 0..k {
            current.push(previous[i] + r * previous[k - i - 1]);
        }
        current.push(r);
        previous = current;
    }

    previous.into_iter().map(|c| -c).collect()
}

/// Constrain `unconstrained` to invertible moving-average coefficients.
pub fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .into_iter()
        .map(|c| -c)
        .collect()
}
