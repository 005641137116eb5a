//! Lag polynomial arithmetic
//!
//! Builds the autoregressive, moving-average and differencing operators of a
//! multiplicative seasonal model and multiplies them together.

/// Multiply two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }

    product
}

/// Autoregressive operator `1 - c1 B^s - c2 B^2s - ...` for lag spacing `period`.
///
/// A `period` of 1 gives the non-seasonal operator.
pub fn ar_polynomial(coefficients: &[f64], period: usize) -> Vec<f64> {
    lag_polynomial(coefficients, period, -1.0)
}

/// Moving-average operator `1 + c1 B^s + c2 B^2s + ...` for lag spacing `period`.
pub fn ma_polynomial(coefficients: &[f64], period: usize) -> Vec<f64> {
    lag_polynomial(coefficients, period, 1.0)
}

fn lag_polynomial(coefficients: &[f64], period: usize, sign: f64) -> Vec<f64> {
    let period = period.max(1);
    let mut poly = vec![0.0; coefficients.len() * period + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * period] = sign * c;
    }
    poly
}

/// Differencing operator `(1 - B)^d (1 - B^s)^D`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    let first = ar_polynomial(&[1.0], 1);
    for _ in 0..d {
        poly = multiply(&poly, &first);
    }

    if period > 0 {
        let seasonal = ar_polynomial(&[1.0], period);
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }

    poly
}

/// Degree of a lag polynomial, ignoring trailing zero coefficients.
pub fn degree(poly: &[f64]) -> usize {
    poly.iter().rposition(|&c| c != 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply() {
        // (1 - 0.5B)(1 + 0.2B) = 1 - 0.3B - 0.1B^2
        let product = multiply(&[1.0, -0.5], &[1.0, 0.2]);
        assert_eq!(product.len(), 3);
        assert!((product[0] - 1.0).abs() < 1e-12);
        assert!((product[1] + 0.3).abs() < 1e-12);
        assert!((product[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_seasonal_ar_polynomial() {
        let poly = ar_polynomial(&[0.4], 12);
        assert_eq!(poly.len(), 13);
        assert_eq!(poly[0], 1.0);
        assert_eq!(poly[12], -0.4);
        assert!(poly[1..12].iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_ma_polynomial_signs() {
        assert_eq!(ma_polynomial(&[0.3, -0.2], 1), vec![1.0, 0.3, -0.2]);
    }

    #[test]
    fn test_differencing_polynomial() {
        // (1 - B)(1 - B^12) = 1 - B - B^12 + B^13
        let poly = differencing_polynomial(1, 1, 12);
        assert_eq!(poly.len(), 14);
        assert_eq!(poly[0], 1.0);
        assert_eq!(poly[1], -1.0);
        assert_eq!(poly[12], -1.0);
        assert_eq!(poly[13], 1.0);
        assert_eq!(degree(&poly), 13);
    }

    #[test]
    fn test_no_differencing_is_identity() {
        assert_eq!(differencing_polynomial(0, 0, 12), vec![1.0]);
        assert_eq!(degree(&[1.0]), 0);
    }
}
