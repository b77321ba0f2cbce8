//! Per-group record written to an attention backward workspace.

use bytemuck::{Pod, Zeroable};

/// Lengths, strides and base offsets of one group, widened to `i64`.
///
/// All strides and offsets are in **elements**, not bytes.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct AttentionBackwardGroupRecord {
    pub q_lengths: [i64; 4],
    pub q_strides: [i64; 4],
    pub k_lengths: [i64; 4],
    pub k_strides: [i64; 4],
    pub z_lengths: [i64; 4],
    pub z_strides: [i64; 4],
    pub v_lengths: [i64; 4],
    pub v_strides: [i64; 4],
    pub y_lengths: [i64; 4],
    pub y_strides: [i64; 4],
    pub lse_lengths: [i64; 3],
    pub lse_strides: [i64; 3],
    pub q_offset: i64,
    pub k_offset: i64,
    pub v_offset: i64,
    pub y_offset: i64,
    pub z_offset: i64,
    pub lse_offset: i64,
}
