//! split parameters

use std::time::{SystemTime, UNIX_EPOCH};

use crate::sharing::check_parameters;
use crate::Result;

/// how a file is split: `total` shards, any `threshold` of which bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    total: u8,
    threshold: u8,
    timestamp: Option<i64>,
}

impl SplitConfig {
    /// 2 <= threshold <= total <= 255
    pub fn new(total: usize, threshold: usize) -> Result<Self> {
        check_parameters(total, threshold)?;
        Ok(Self {
            total: total as u8,
            threshold: threshold as u8,
            timestamp: None,
        })
    }

    /// pin the split timestamp instead of reading the clock
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// every shard needed, so the payload is dealt out instead of copied
    pub fn all_required(&self) -> bool {
        self.threshold == self.total
    }

    pub(crate) fn timestamp(&self) -> i64 {
        self.timestamp.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        })
    }
}
