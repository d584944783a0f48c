//! Partitioned Rice coding of prediction residuals
//!
//! The residual of a block is split into `2^order` partitions. The first
//! partition is shorter by the predictor order because the warm-up samples
//! carry no residual. Each partition stores its own Rice parameter, or an
//! escape code followed by a 5-bit raw width for plainly coded values.

use crate::codec::bitstream::BitWriter;

/// Largest partition order the 4-bit field can hold
pub const MAX_PARTITION_ORDER: u32 = 15;

const METHOD_RICE: u32 = 0;
const METHOD_RICE2: u32 = 1;
const ESCAPE_RICE: u32 = 15;
const ESCAPE_RICE2: u32 = 31;
const MAX_RICE_PARAM: u32 = 30;
const MAX_RAW_WIDTH: u32 = 31;

/// How one partition is coded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionCoding {
    /// Rice code with this parameter
    Rice(u32),
    /// Raw two's complement values of this width
    Escaped(u32),
}

/// A chosen residual coding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualPlan {
    /// Use 5-bit Rice parameters
    pub wide_params: bool,
    pub partition_order: u32,
    pub partitions: Vec<PartitionCoding>,
    /// Estimated size in bits, including the method and order fields
    pub bits: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct PartitionStats {
    count: u64,
    sum: u64,
    /// Width needed to store every value as raw two's complement
    width: u32,
}

impl PartitionStats {
    fn merge(self, other: PartitionStats) -> PartitionStats {
        PartitionStats {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            width: self.width.max(other.width),
        }
    }

    /// Cheapest coding of this partition and its estimated cost in bits
    /// (excluding the parameter field)
    fn best_coding(&self) -> (PartitionCoding, u64) {
        let mean = if self.count > 0 { self.sum / self.count } else { 0 };
        let guess = if mean == 0 { 0 } else { 63 - mean.leading_zeros() };

        let mut best = (PartitionCoding::Rice(0), u64::MAX);
        let low = guess.saturating_sub(1).min(MAX_RICE_PARAM);
        for k in low..=(guess + 1).min(MAX_RICE_PARAM) {
            let cost = self.count * (k as u64 + 1) + (self.sum >> k);
            if cost < best.1 {
                best = (PartitionCoding::Rice(k), cost);
            }
        }

        if self.width <= MAX_RAW_WIDTH {
            let cost = 5 + self.count * self.width as u64;
            if cost < best.1 {
                best = (PartitionCoding::Escaped(self.width), cost);
            }
        }

        best
    }
}

fn fold(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn raw_width(value: i64) -> u32 {
    if value == 0 {
        0
    } else {
        65 - (value ^ (value >> 63)).leading_zeros()
    }
}

/// Length of partition `index` out of `2^order`
fn partition_len(block_size: usize, predictor_order: usize, order: u32, index: usize) -> usize {
    let len = block_size >> order;
    if index == 0 {
        len - predictor_order
    } else {
        len
    }
}

/// Highest partition order usable for this block
fn max_usable_order(block_size: usize, predictor_order: usize, limit: u32) -> u32 {
    let mut order = 0;
    while order < limit.min(MAX_PARTITION_ORDER) {
        let next = order + 1;
        if block_size % (1 << next) != 0 || (block_size >> next) <= predictor_order {
            break;
        }
        order = next;
    }
    order
}

/// Search partition orders up to `max_partition_order` for the cheapest coding
pub fn plan(
    residual: &[i64],
    block_size: usize,
    predictor_order: usize,
    max_partition_order: u32,
) -> ResidualPlan {
    let top = max_usable_order(block_size, predictor_order, max_partition_order);

    // Statistics at the finest order, merged pairwise for coarser ones
    let mut stats = Vec::with_capacity(1 << top);
    let mut start = 0;
    for index in 0..(1usize << top) {
        let len = partition_len(block_size, predictor_order, top, index);
        let part = &residual[start..start + len];
        start += len;
        stats.push(part.iter().fold(PartitionStats::default(), |acc, &r| PartitionStats {
            count: acc.count + 1,
            sum: acc.sum + fold(r),
            width: acc.width.max(raw_width(r)),
        }));
    }

    let mut best: Option<ResidualPlan> = None;
    let mut order = top;
    loop {
        let choices: Vec<(PartitionCoding, u64)> =
            stats.iter().map(PartitionStats::best_coding).collect();
        let wide_params = choices
            .iter()
            .any(|(coding, _)| matches!(coding, PartitionCoding::Rice(k) if *k >= ESCAPE_RICE));
        let param_bits = if wide_params { 5 } else { 4 };
        let bits = choices
            .iter()
            .fold(6u64, |acc, &(_, cost)| acc.saturating_add(param_bits + cost));

        if best.as_ref().map_or(true, |b| bits < b.bits) {
            best = Some(ResidualPlan {
                wide_params,
                partition_order: order,
                partitions: choices.into_iter().map(|(coding, _)| coding).collect(),
                bits,
            });
        }

        if order == 0 {
            break;
        }
        order -= 1;
        stats = stats.chunks(2).map(|pair| pair[0].merge(pair[1])).collect();
    }

    // The loop runs at least once
    best.unwrap_or(ResidualPlan {
        wide_params: false,
        partition_order: 0,
        partitions: vec![PartitionCoding::Rice(0)],
        bits: u64::MAX,
    })
}

/// Write `residual` following `plan`
pub fn write_residual(
    writer: &mut BitWriter,
    residual: &[i64],
    plan: &ResidualPlan,
    block_size: usize,
    predictor_order: usize,
) {
    let (method, param_bits, escape) = if plan.wide_params {
        (METHOD_RICE2, 5, ESCAPE_RICE2)
    } else {
        (METHOD_RICE, 4, ESCAPE_RICE)
    };

    writer.write_bits(method as u64, 2);
    writer.write_bits(plan.partition_order as u64, 4);

    let mut start = 0;
    for (index, coding) in plan.partitions.iter().enumerate() {
        let len = partition_len(block_size, predictor_order, plan.partition_order, index);
        let part = &residual[start..start + len];
        start += len;

        match *coding {
            PartitionCoding::Rice(k) => {
                writer.write_bits(k as u64, param_bits);
                for &r in part {
                    writer.write_rice(r, k);
                }
            }
            PartitionCoding::Escaped(width) => {
                writer.write_bits(escape as u64, param_bits);
                writer.write_bits(width as u64, 5);
                for &r in part {
                    writer.write_signed(r, width);
                }
            }
        }
    }
}
