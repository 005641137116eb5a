//! ARMA recursions
//!
//! For an operator pair `ar(B) w_t = ma(B) e_t`, computes the innovations
//! given the observations, extends the series past its end, and derives the
//! psi weights that drive forecast error variance.
//!
//! Values before the start of the series are taken to be zero, which makes
//! `residuals` the conditional-sum-of-squares objective.

/// One-step innovations `e_t` of `w` under `ar(B) w_t = ma(B) e_t`.
pub fn residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut e = Vec::with_capacity(w.len());

    for t in 0..w.len() {
        let mut value = w[t];
        for k in 1..ar.len().min(t + 1) {
            value += ar[k] * w[t - k];
        }
        for k in 1..ma.len().min(t + 1) {
            value -= ma[k] * e[t - k];
        }
        e.push(value);
    }

    e
}

/// Extend `w` by `horizon` steps, with future innovations set to zero.
pub fn forecast(w: &[f64], e: &[f64], ar: &[f64], ma: &[f64], horizon: usize) -> Vec<f64> {
    let n = w.len();
    let mut extended = w.to_vec();

    for t in n..n + horizon {
        let mut value = 0.0;
        for k in 1..ar.len().min(t + 1) {
            value -= ar[k] * extended[t - k];
        }
        for k in 1..ma.len().min(t + 1) {
            // Only past innovations are known
            if t - k < n {
                if let Some(&innovation) = e.get(t - k) {
                    value += ma[k] * innovation;
                }
            }
        }
        extended.push(value);
    }

    extended.split_off(n)
}

/// First `count` coefficients of `ma(B) / ar(B)`.
///
/// `psi[0]` is always one; the h-step forecast variance is
/// `sigma^2 * sum(psi[0..h]^2)`.
pub fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);

    for j in 0..count {
        let mut value = if j == 0 {
            1.0
        } else {
            ma.get(j).copied().unwrap_or(0.0)
        };
        for k in 1..ar.len().min(j + 1) {
            value -= ar[k] * psi[j - k];
        }
        psi.push(value);
    }

    psi
}
