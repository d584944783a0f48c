//! Subframe encoding search and serialization
//!
//! Subframe header: one zero padding bit, a 6-bit type, and a wasted-bits
//! flag optionally followed by a unary count. Types:
//!
//! | code      | subframe                 |
//! |-----------|--------------------------|
//! | 0         | CONSTANT                 |
//! | 1         | VERBATIM                 |
//! | 8 + n     | FIXED, order n (0-4)     |
//! | 32 + n-1  | LPC, order n (1-32)      |

use super::lpc::{self, FIXED_COEFFICIENTS, MAX_LPC_ORDER, MAX_PRECISION};
use super::residual::{self, ResidualPlan};
use crate::codec::bitstream::BitWriter;
use crate::codec::encoder::SearchLimits;

const TYPE_CONSTANT: u64 = 0;
const TYPE_VERBATIM: u64 = 1;
const TYPE_FIXED: u64 = 8;
const TYPE_LPC: u64 = 32;

const EXHAUSTIVE_PRECISIONS: std::ops::RangeInclusive<u32> = 12..=MAX_PRECISION;

/// Prediction method of a chosen subframe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubframeKind {
    Constant,
    Verbatim,
    Fixed {
        order: usize,
        residual: Vec<i64>,
        plan: ResidualPlan,
    },
    Lpc {
        coefs: Vec<i64>,
        precision: u32,
        shift: u32,
        residual: Vec<i64>,
        plan: ResidualPlan,
    },
}

/// An encoded subframe ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubframeEncoding {
    pub kind: SubframeKind,
    /// Low-order zero bits removed from every sample
    pub wasted_bits: u32,
    /// Depth after removing wasted bits
    pub depth: u32,
    /// Samples after removing wasted bits
    pub signal: Vec<i64>,
    /// Size in bits (estimated for residual-coded subframes)
    pub bits: u64,
}

impl SubframeEncoding {
    /// Find the smallest encoding of `samples` at `depth` bits within `limits`
    ///
    /// VERBATIM is always a candidate, so a result exists for any input.
    pub fn search(samples: &[i64], depth: u32, limits: &SearchLimits) -> Self {
        let n = samples.len();
        let combined = samples.iter().fold(0i64, |acc, &s| acc | s);
        let wasted_bits = if combined == 0 || depth <= 1 {
            0
        } else {
            combined.trailing_zeros().min(depth - 1)
        };

        let signal: Vec<i64> = samples.iter().map(|&s| s >> wasted_bits).collect();
        let depth = depth - wasted_bits;
        let header_bits = 8 + wasted_bits as u64;

        if n > 0 && signal.iter().all(|&s| s == signal[0]) {
            return SubframeEncoding {
                kind: SubframeKind::Constant,
                wasted_bits,
                depth,
                signal,
                bits: header_bits + depth as u64,
            };
        }

        let mut best_kind = SubframeKind::Verbatim;
        let mut best_bits = header_bits + depth as u64 * n as u64;

        let max_fixed = limits.max_fixed_order.min(n.saturating_sub(1)).min(4);
        for order in 0..=max_fixed {
            let Some(residual) = lpc::compute_residual(&signal, FIXED_COEFFICIENTS[order], 0) else {
                continue;
            };
            let plan = residual::plan(&residual, n, order, limits.max_partition_order);
            let bits = header_bits
                .saturating_add(order as u64 * depth as u64)
                .saturating_add(plan.bits);
            if bits < best_bits {
                best_bits = bits;
                best_kind = SubframeKind::Fixed {
                    order,
                    residual,
                    plan,
                };
            }
        }

        let max_lpc = limits
            .max_lpc_order
            .min(MAX_LPC_ORDER)
            .min(n.saturating_sub(1));
        if max_lpc > 0 {
            let autoc = lpc::autocorrelation(&lpc::welch_window(&signal), max_lpc);
            let solutions = lpc::levinson_durbin(&autoc, max_lpc);

            let candidates: Vec<(usize, u32)> = if limits.exhaustive {
                (1..=solutions.len())
                    .flat_map(|order| EXHAUSTIVE_PRECISIONS.map(move |p| (order, p)))
                    .collect()
            } else {
                let precision = lpc::default_precision(n).min(MAX_PRECISION);
                estimate_best_order(&solutions, n, depth, precision)
                    .map(|order| vec![(order, precision)])
                    .unwrap_or_default()
            };

            for (order, precision) in candidates {
                let quantized = lpc::quantize_coefficients(&solutions[order - 1].0, precision);
                let Some((coefs, shift)) = quantized else {
                    continue;
                };
                let Some(residual) = lpc::compute_residual(&signal, &coefs, shift) else {
                    continue;
                };
                let plan = residual::plan(&residual, n, order, limits.max_partition_order);
                let bits = (header_bits + 9)
                    .saturating_add(order as u64 * (depth + precision) as u64)
                    .saturating_add(plan.bits);
                if bits < best_bits {
                    best_bits = bits;
                    best_kind = SubframeKind::Lpc {
                        coefs,
                        precision,
                        shift,
                        residual,
                        plan,
                    };
                }
            }
        }

        SubframeEncoding {
            kind: best_kind,
            wasted_bits,
            depth,
            signal,
            bits: best_bits,
        }
    }

    /// Write the subframe
    pub fn write(&self, writer: &mut BitWriter) {
        let n = self.signal.len();
        let type_code = match &self.kind {
            SubframeKind::Constant => TYPE_CONSTANT,
            SubframeKind::Verbatim => TYPE_VERBATIM,
            SubframeKind::Fixed { order, .. } => TYPE_FIXED + *order as u64,
            SubframeKind::Lpc { coefs, .. } => TYPE_LPC + coefs.len() as u64 - 1,
        };

        writer.write_bit(false);
        writer.write_bits(type_code, 6);
        if self.wasted_bits > 0 {
            writer.write_bit(true);
            writer.write_unary(self.wasted_bits as u64 - 1);
        } else {
            writer.write_bit(false);
        }

        match &self.kind {
            SubframeKind::Constant => {
                writer.write_signed(self.signal[0], self.depth);
            }
            SubframeKind::Verbatim => {
                for &s in &self.signal {
                    writer.write_signed(s, self.depth);
                }
            }
            SubframeKind::Fixed {
                order,
                residual,
                plan,
            } => {
                for &s in &self.signal[..*order] {
                    writer.write_signed(s, self.depth);
                }
                residual::write_residual(writer, residual, plan, n, *order);
            }
            SubframeKind::Lpc {
                coefs,
                precision,
                shift,
                residual,
                plan,
            } => {
                let order = coefs.len();
                for &s in &self.signal[..order] {
                    writer.write_signed(s, self.depth);
                }
                writer.write_bits(*precision as u64 - 1, 4);
                writer.write_signed(*shift as i64, 5);
                for &c in coefs {
                    writer.write_signed(c, *precision);
                }
                residual::write_residual(writer, residual, plan, n, order);
            }
        }
    }
}

/// Pick the LPC order with the lowest estimated size
fn estimate_best_order(
    solutions: &[(Vec<f64>, f64)],
    block_size: usize,
    depth: u32,
    precision: u32,
) -> Option<usize> {
    solutions
        .iter()
        .enumerate()
        .map(|(i, (_, error))| {
            let order = i + 1;
            let residual_bits = lpc::expected_bits_per_sample(*error, block_size)
                * block_size.saturating_sub(order) as f64;
            let overhead = (order as u32 * (depth + precision)) as f64;
            (order, residual_bits + overhead)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(order, _)| order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encoder::SearchEffort;

    /// Rebuild the samples an encoding describes, undoing prediction
    fn reconstruct(encoding: &SubframeEncoding) -> Vec<i64> {
        let signal = &encoding.signal;
        let rebuilt = match &encoding.kind {
            SubframeKind::Constant => vec![signal[0]; signal.len()],
            SubframeKind::Verbatim => signal.clone(),
            SubframeKind::Fixed { order, residual, .. } => {
                let mut buffer = signal[..*order].to_vec();
                buffer.extend_from_slice(residual);
                lpc::restore_signal(&mut buffer, FIXED_COEFFICIENTS[*order], 0);
                buffer
            }
            SubframeKind::Lpc {
                coefs,
                shift,
                residual,
                ..
            } => {
                let mut buffer = signal[..coefs.len()].to_vec();
                buffer.extend_from_slice(residual);
                lpc::restore_signal(&mut buffer, coefs, *shift);
                buffer
            }
        };
        rebuilt.into_iter().map(|s| s << encoding.wasted_bits).collect()
    }

    fn search(samples: &[i64], depth: u32, effort: SearchEffort) -> SubframeEncoding {
        let encoding = SubframeEncoding::search(samples, depth, &effort.limits());
        assert_eq!(reconstruct(&encoding), samples, "{:?} at {} bits", effort, depth);

        let mut bw = BitWriter::new();
        encoding.write(&mut bw);
        if !matches!(encoding.kind, SubframeKind::Fixed { .. } | SubframeKind::Lpc { .. }) {
            assert_eq!(bw.bit_len(), encoding.bits);
        }
        encoding
    }

    #[test]
    fn test_constant() {
        let encoding = search(&[-7; 100], 16, SearchEffort::Best);
        assert_eq!(encoding.kind, SubframeKind::Constant);
        assert_eq!(encoding.bits, 8 + 16);
    }

    #[test]
    fn test_wasted_bits() {
        let samples: Vec<i64> = (0..256).map(|i| ((i * 37) % 101 - 50) << 8).collect();
        let encoding = search(&samples, 24, SearchEffort::Fast);
        assert_eq!(encoding.wasted_bits, 8);
        assert_eq!(encoding.depth, 16);
    }

    #[test]
    fn test_ramp_uses_fixed() {
        let samples: Vec<i64> = (0..1024).map(|i| i * 3 - 1500).collect();
        let encoding = search(&samples, 16, SearchEffort::Fast);
        assert!(matches!(encoding.kind, SubframeKind::Fixed { .. }));
    }

    #[test]
    fn test_sine_every_effort() {
        let samples: Vec<i64> = (0..4096)
            .map(|i| {
                let t = i as f64;
                ((t * 0.031).sin() * 12000.0 + (t * 0.17).cos() * 900.0) as i64
            })
            .collect();
        for effort in SearchEffort::ALL {
            let encoding = search(&samples, 16, effort);
            assert!(encoding.bits < 16 * 4096);
        }
    }

    #[test]
    fn test_noise_falls_back_to_verbatim() {
        let mut state: u32 = 12345;
        let samples: Vec<i64> = (0..32)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345) & 0x7FFF_FFFF;
                ((state >> 16) & 0xFF) as i64 - 128
            })
            .collect();
        let encoding = search(&samples, 8, SearchEffort::Fast);
        assert_eq!(encoding.kind, SubframeKind::Verbatim);
        assert_eq!(encoding.bits, 8 + 8 * 32);
    }

    #[test]
    fn test_full_scale_alternation() {
        // Most predictors overflow the 32-bit residual range here
        let samples: Vec<i64> = (0..64)
            .map(|i| if i % 2 == 0 { i32::MAX as i64 } else { i32::MIN as i64 })
            .collect();
        for effort in SearchEffort::ALL {
            search(&samples, 32, effort);
        }
    }

    #[test]
    fn test_side_channel_depth() {
        let samples: Vec<i64> = (0..300)
            .map(|i| if i % 3 == 0 { 65535 } else { -65536 + i })
            .collect();
        search(&samples, 17, SearchEffort::Medium);
    }

    #[test]
    fn test_tiny_blocks() {
        search(&[5], 8, SearchEffort::Exhaustive);
        search(&[5, -3], 8, SearchEffort::Exhaustive);
        search(&[1, 2, 4, 8, 16, -100, 3], 8, SearchEffort::Exhaustive);
    }

    #[test]
    fn test_header_layout() {
        let encoding = SubframeEncoding::search(&[3; 16], 8, &SearchEffort::Fast.limits());
        let mut bw = BitWriter::new();
        encoding.write(&mut bw);
        // padding 0, type CONSTANT, no wasted bits, then the 8-bit value
        assert_eq!(bw.into_bytes(), vec![0x00, 0x03]);
    }
}
