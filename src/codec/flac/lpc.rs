//! Linear prediction for FIXED and LPC subframes
//!
//! Both subframe types predict sample `i` as
//! `(sum_j coef[j] * s[i - 1 - j]) >> shift`; FIXED subframes use the
//! polynomial coefficients below with a shift of zero. Encoder arithmetic is
//! done in `i64`; predictions and residuals are kept within 32 bits because
//! decoders rebuild samples in `i32`.

/// Maximum LPC order
pub const MAX_LPC_ORDER: usize = 32;

/// Maximum quantized coefficient precision in bits
pub const MAX_PRECISION: u32 = 15;

/// Largest shift expressible in the 5-bit signed shift field
const MAX_SHIFT: i32 = 15;

/// Polynomial predictor coefficients of the FIXED orders 0-4
pub const FIXED_COEFFICIENTS: [&[i64]; 5] = [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];

/// Compute residuals of `samples` for the given predictor
///
/// Returns `None` when any prediction leaves the 32-bit range, or any residual
/// falls outside the symmetric 32-bit range the residual coder can carry.
pub fn compute_residual(samples: &[i64], coefs: &[i64], shift: u32) -> Option<Vec<i64>> {
    let order = coefs.len();
    if samples.len() < order {
        return None;
    }

    let mut residual = Vec::with_capacity(samples.len() - order);
    for i in order..samples.len() {
        let prediction: i64 = coefs
            .iter()
            .enumerate()
            .map(|(j, &c)| c * samples[i - 1 - j])
            .sum::<i64>()
            >> shift;
        if i32::try_from(prediction).is_err() {
            return None;
        }
        let r = samples[i] - prediction;
        if r > i32::MAX as i64 || r < -(i32::MAX as i64) {
            return None;
        }
        residual.push(r);
    }
    Some(residual)
}

/// Rebuild samples in place from warm-up samples followed by residuals
///
/// `buffer[..order]` holds the warm-up samples and `buffer[order..]` the
/// residuals on entry.
#[cfg(test)]
pub(crate) fn restore_signal(buffer: &mut [i64], coefs: &[i64], shift: u32) {
    let order = coefs.len();
    for i in order..buffer.len() {
        let prediction: i64 = coefs
            .iter()
            .enumerate()
            .map(|(j, &c)| c.wrapping_mul(buffer[i - 1 - j]))
            .fold(0i64, i64::wrapping_add)
            >> shift;
        buffer[i] = buffer[i].wrapping_add(prediction);
    }
}

/// Apply a Welch window
pub fn welch_window(samples: &[i64]) -> Vec<f64> {
    let len = samples.len();
    if len < 2 {
        return samples.iter().map(|&s| s as f64).collect();
    }

    let half = (len - 1) as f64 / 2.0;
    samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let x = (i as f64 - half) / half;
            s as f64 * (1.0 - x * x)
        })
        .collect()
}

/// Autocorrelation for lags 0..=max_lag
pub fn autocorrelation(signal: &[f64], max_lag: usize) -> Vec<f64> {
    (0..=max_lag)
        .map(|lag| {
            if lag >= signal.len() {
                return 0.0;
            }
            signal[lag..]
                .iter()
                .zip(signal)
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Levinson-Durbin recursion
///
/// Returns, for every order `1..=n`, the predictor coefficients (already
/// negated into prediction form) and the remaining prediction error. The
/// recursion stops early when the error reaches zero.
pub fn levinson_durbin(autoc: &[f64], max_order: usize) -> Vec<(Vec<f64>, f64)> {
    let mut results = Vec::with_capacity(max_order);
    if autoc.is_empty() || autoc[0] <= 0.0 {
        return results;
    }

    let max_order = max_order.min(autoc.len() - 1);
    let mut lpc = vec![0.0f64; max_order];
    let mut err = autoc[0];

    for i in 0..max_order {
        let mut r = -autoc[i + 1];
        for j in 0..i {
            r -= lpc[j] * autoc[i - j];
        }
        r /= err;

        lpc[i] = r;
        let half = i >> 1;
        for j in 0..half {
            let tmp = lpc[j];
            lpc[j] += r * lpc[i - 1 - j];
            lpc[i - 1 - j] += r * tmp;
        }
        if i & 1 == 1 {
            lpc[half] += lpc[half] * r;
        }

        err *= 1.0 - r * r;
        results.push((lpc[..=i].iter().map(|&c| -c).collect(), err));

        if err <= 0.0 {
            break;
        }
    }

    results
}

/// Quantize coefficients to `precision` signed bits with error feedback
///
/// Returns the integer coefficients and the right shift, or `None` if every
/// coefficient is zero or the scale cannot be represented.
pub fn quantize_coefficients(coefs: &[f64], precision: u32) -> Option<(Vec<i64>, u32)> {
    let precision = precision.clamp(2, MAX_PRECISION) - 1;
    let qmax = (1i64 << precision) - 1;
    let qmin = -(1i64 << precision);

    let cmax = coefs.iter().fold(0.0f64, |m, &c| m.max(c.abs()));
    if cmax <= 0.0 || !cmax.is_finite() {
        return None;
    }

    let log2cmax = cmax.log2().floor() as i32 + 1;
    let shift = (precision as i32 - log2cmax).min(MAX_SHIFT);

    let mut quantized = Vec::with_capacity(coefs.len());
    let mut error = 0.0f64;
    if shift >= 0 {
        let scale = (1i64 << shift) as f64;
        for &c in coefs {
            error += c * scale;
            let q = (error.round() as i64).clamp(qmin, qmax);
            error -= q as f64;
            quantized.push(q);
        }
        Some((quantized, shift as u32))
    } else {
        let scale = (1i64 << -shift) as f64;
        for &c in coefs {
            error += c / scale;
            let q = (error.round() as i64).clamp(qmin, qmax);
            error -= q as f64;
            quantized.push(q);
        }
        Some((quantized, 0))
    }
}

/// Estimated residual bits per sample for a prediction error
pub fn expected_bits_per_sample(error: f64, num_samples: usize) -> f64 {
    if error > 0.0 && num_samples > 0 {
        let scale = 0.5 / num_samples as f64;
        (0.5 * (scale * error).log2()).max(0.0)
    } else if error < 0.0 {
        1e32
    } else {
        0.0
    }
}

/// Default coefficient precision for a block size
pub fn default_precision(block_size: usize) -> u32 {
    match block_size {
        0..=192 => 7,
        193..=384 => 8,
        385..=576 => 9,
        577..=1152 => 10,
        1153..=2304 => 11,
        2305..=4608 => 12,
        _ => 13,
    }
}
