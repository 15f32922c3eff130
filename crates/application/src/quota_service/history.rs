use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use clawcook_core::{AppError, AppResult};

use super::metrics::QuotaMetricsSnapshot;

/// Maximum number of points retained in memory.
pub const METRICS_HISTORY_CAPACITY: usize = 360;

const METRICS_HISTORY_MIN_LIMIT: usize = 2;

/// Timestamped metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaMetricsPoint {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Counter values at that instant.
    #[serde(flatten)]
    pub snapshot: QuotaMetricsSnapshot,
}

/// Bounded, in-memory ring of metrics points.
#[derive(Debug, Clone, Default)]
pub struct QuotaMetricsHistory {
    points: Arc<Mutex<VecDeque<QuotaMetricsPoint>>>,
}

impl QuotaMetricsHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point, evicting the oldest beyond capacity.
    pub fn append(&self, point: QuotaMetricsPoint) -> AppResult<()> {
        let mut points = self.points.lock().map_err(|error| {
            AppError::Internal(format!("failed to lock metrics history: {error}"))
        })?;

        points.push_back(point);
        while points.len() > METRICS_HISTORY_CAPACITY {
            points.pop_front();
        }

        Ok(())
    }

    /// Returns up to `limit` most recent points, oldest first.
    ///
    /// `limit` is clamped to `2..=METRICS_HISTORY_CAPACITY`.
    pub fn recent(&self, limit: usize) -> AppResult<Vec<QuotaMetricsPoint>> {
        let limit = limit.clamp(METRICS_HISTORY_MIN_LIMIT, METRICS_HISTORY_CAPACITY);
        let points = self.points.lock().map_err(|error| {
            AppError::Internal(format!("failed to lock metrics history: {error}"))
        })?;

        let skip = points.len().saturating_sub(limit);
        Ok(points.iter().skip(skip).copied().collect())
    }
}
