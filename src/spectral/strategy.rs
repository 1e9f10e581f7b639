use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// How the per-channel transforms are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FftStrategy {
    /// Batched when it fits within the memory budget, channel-at-a-time otherwise
    #[default]
    Auto,
    /// One bulk transform over every channel
    Batched,
    /// One reusable buffer, channels transformed in turn
    #[serde(rename = "channel", alias = "channel-at-a-time")]
    ChannelAtATime,
}

/// Strategy actually used for a transform, after `Auto` has been resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedStrategy {
    /// One bulk transform over every channel
    Batched,
    /// One reusable buffer per worker
    ChannelAtATime,
}

/// Transient bytes needed by the batched transform: one complex buffer
/// holding every channel plus the power output.
pub fn batched_working_bytes(n_pulses: usize, n_channels: usize) -> u64 {
    let n_freq = (n_pulses / 2 + 1) as u64;
    let cells = n_pulses as u64 * n_channels as u64;
    cells * size_of::<Complex<f64>>() as u64 + n_freq * n_channels as u64 * size_of::<f64>() as u64
}

/// Transient bytes needed by one channel-at-a-time worker: the signal
/// buffer and the transform scratch.
pub fn channel_working_bytes(n_pulses: usize) -> u64 {
    2 * n_pulses as u64 * size_of::<Complex<f64>>() as u64
}

impl FftStrategy {
    /// Pick the concrete strategy for a cube of `n_pulses x n_channels`
    pub fn resolve(self, n_pulses: usize, n_channels: usize, budget_bytes: u64) -> ResolvedStrategy {
        match self {
            FftStrategy::Batched => ResolvedStrategy::Batched,
            FftStrategy::ChannelAtATime => ResolvedStrategy::ChannelAtATime,
            FftStrategy::Auto => {
                if batched_working_bytes(n_pulses, n_channels) <= budget_bytes {
                    ResolvedStrategy::Batched
                } else {
                    ResolvedStrategy::ChannelAtATime
                }
            }
        }
    }

    /// Returns all accepted strategy names.
    pub fn variants() -> &'static [&'static str] {
        &["auto", "batched", "channel"]
    }
}

impl fmt::Display for FftStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftStrategy::Auto => write!(f, "auto"),
            FftStrategy::Batched => write!(f, "batched"),
            FftStrategy::ChannelAtATime => write!(f, "channel"),
        }
    }
}

impl fmt::Display for ResolvedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedStrategy::Batched => write!(f, "batched"),
            ResolvedStrategy::ChannelAtATime => write!(f, "channel-at-a-time"),
        }
    }
}

impl FromStr for FftStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(FftStrategy::Auto),
            "batched" | "batch" => Ok(FftStrategy::Batched),
            "channel" | "channel-at-a-time" => Ok(FftStrategy::ChannelAtATime),
            _ => Err(format!(
                "Unknown FFT strategy '{}'. Valid options: {}",
                s,
                FftStrategy::variants().join(", ")
            )),
        }
    }
}
