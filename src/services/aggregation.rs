//! Time-series aggregation over hits and failures.
//!
//! Everything here is a pure function of its inputs: observations may arrive
//! in any order, windows are inclusive on both ends, and bucket boundaries
//! depend only on the window and the bucket count.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::models::{Failure, FailureKind, Hit};

/// Observations processed between two cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Closed time range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if end < start {
            return Err(AppError::Validation(format!(
                "window end {} precedes start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of `length` ending at `end`
    pub fn ending_at(end: DateTime<Utc>, length: Duration) -> AppResult<Self> {
        let start = end.checked_sub_signed(length).ok_or_else(|| {
            AppError::Validation(format!(
                "window of {}s ending at {} starts before the earliest timestamp",
                length.num_seconds(),
                end.to_rfc3339()
            ))
        })?;
        Self::new(start, end)
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A single numeric reading at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(at: DateTime<Utc>, value: f64) -> Self {
        Self { at, value }
    }
}

/// How readings inside one bucket are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Arithmetic mean; empty buckets have no value
    Average,
    /// Number of readings; empty buckets count zero
    Count,
}

/// One point of a bucketed series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketPoint {
    pub timestamp: DateTime<Utc>,
    /// `None` marks an empty averaged bucket
    pub value: Option<f64>,
}

fn ensure_active(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}

/// Width of each bucket: the window span divided by `count`, rounded up
pub fn bucket_width(window: &Window, count: usize) -> Duration {
    let span = window.span().num_milliseconds();
    let count = count.max(1) as i64;
    Duration::milliseconds((span + count - 1) / count)
}

/// Start timestamps of every bucket, in chronological order
pub fn bucket_starts(window: &Window, count: usize) -> Vec<DateTime<Utc>> {
    let width = bucket_width(window, count);
    (0..count as i32).map(|i| window.start + width * i).collect()
}

fn bucket_index(window: &Window, width: Duration, count: usize, at: DateTime<Utc>) -> usize {
    let width = width.num_milliseconds();
    if width == 0 {
        return 0;
    }
    let offset = (at - window.start).num_milliseconds();
    ((offset / width) as usize).min(count - 1)
}

/// Buckets `samples` into `bucket_count` equal-width intervals of `window`.
///
/// Always returns exactly `bucket_count` points; samples outside the window
/// are ignored. Fails with `Cancelled` rather than returning a partial series.
pub fn bucket(
    samples: &[Sample],
    window: &Window,
    aggregation: Aggregation,
    bucket_count: usize,
    cancel: &CancellationToken,
) -> AppResult<Vec<BucketPoint>> {
    if bucket_count == 0 {
        return Err(AppError::Validation(
            "bucket count must be at least 1".to_string(),
        ));
    }
    ensure_active(cancel)?;

    let mut in_window: Vec<&Sample> = samples.iter().filter(|s| window.contains(s.at)).collect();
    // Sorted so floating point sums do not depend on storage order
    in_window.sort_by_key(|s| s.at);

    let width = bucket_width(window, bucket_count);
    let mut sums = vec![0.0_f64; bucket_count];
    let mut counts = vec![0_u64; bucket_count];

    for (i, sample) in in_window.iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 {
            ensure_active(cancel)?;
        }
        let idx = bucket_index(window, width, bucket_count, sample.at);
        sums[idx] += sample.value;
        counts[idx] += 1;
    }
    ensure_active(cancel)?;

    let points = bucket_starts(window, bucket_count)
        .into_iter()
        .zip(sums.into_iter().zip(counts))
        .map(|(timestamp, (sum, count))| {
            let value = match aggregation {
                Aggregation::Average if count == 0 => None,
                Aggregation::Average => Some(sum / count as f64),
                Aggregation::Count => Some(count as f64),
            };
            BucketPoint { timestamp, value }
        })
        .collect();

    Ok(points)
}

/// Contiguous span during which a service was considered up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UptimePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub online: bool,
}

/// Aggregate availability over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeSummary {
    pub total_checks: u64,
    pub total_failures: u64,
    pub uptime_percentage: f64,
    pub online_duration_ms: i64,
    pub offline_duration_ms: i64,
    pub periods: Vec<UptimePeriod>,
}

/// Infers outages from organic failures.
///
/// An outage starts at a failure and lasts until the first hit strictly after
/// it, or until the window end. Failures inside an open outage extend nothing.
fn outages(
    hit_times: &[DateTime<Utc>],
    failure_times: &[DateTime<Utc>],
    window: &Window,
    cancel: &CancellationToken,
) -> AppResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    let mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();

    for (i, &failed_at) in failure_times.iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 {
            ensure_active(cancel)?;
        }
        if spans.last().is_some_and(|&(_, end)| failed_at < end) {
            continue;
        }
        let next_hit = hit_times.partition_point(|&h| h <= failed_at);
        let end = hit_times.get(next_hit).copied().unwrap_or(window.end);
        spans.push((failed_at, end));
    }

    Ok(spans)
}

/// `part / whole` at nanosecond precision, falling back to milliseconds for
/// spans too long to count in nanoseconds
fn ratio(part: Duration, whole: Duration) -> f64 {
    match (part.num_nanoseconds(), whole.num_nanoseconds()) {
        (Some(p), Some(w)) => p as f64 / w as f64,
        _ => part.num_milliseconds() as f64 / whole.num_milliseconds() as f64,
    }
}

/// Computes check counts and uptime percentage for one service over `window`.
///
/// Trigger failures are counted but never create downtime. A zero-length
/// window reports 100% with no checks.
pub fn uptime(
    hits: &[Hit],
    failures: &[Failure],
    window: &Window,
    cancel: &CancellationToken,
) -> AppResult<UptimeSummary> {
    ensure_active(cancel)?;

    let span = window.span();
    if span.is_zero() {
        return Ok(UptimeSummary {
            total_checks: 0,
            total_failures: 0,
            uptime_percentage: 100.0,
            online_duration_ms: 0,
            offline_duration_ms: 0,
            periods: Vec::new(),
        });
    }

    let mut hit_times: Vec<DateTime<Utc>> = hits
        .iter()
        .map(|h| h.created_at)
        .filter(|&at| window.contains(at))
        .collect();
    hit_times.sort_unstable();

    let failures: Vec<&Failure> = failures
        .iter()
        .filter(|f| window.contains(f.created_at))
        .collect();
    let mut organic_times: Vec<DateTime<Utc>> = failures
        .iter()
        .filter(|f| f.kind == FailureKind::Organic)
        .map(|f| f.created_at)
        .collect();
    organic_times.sort_unstable();

    let spans = outages(&hit_times, &organic_times, window, cancel)?;
    ensure_active(cancel)?;

    let mut periods = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = window.start;
    let mut offline = Duration::zero();
    for (start, end) in spans {
        if start > cursor {
            periods.push(UptimePeriod {
                start: cursor,
                end: start,
                online: true,
            });
        }
        if end > start {
            periods.push(UptimePeriod {
                start,
                end,
                online: false,
            });
            offline = offline + (end - start);
        }
        cursor = end;
    }
    if cursor < window.end {
        periods.push(UptimePeriod {
            start: cursor,
            end: window.end,
            online: true,
        });
    }

    let offline = offline.min(span);
    let online = span - offline;
    let percentage = (ratio(online, span) * 100.0).clamp(0.0, 100.0);

    Ok(UptimeSummary {
        total_checks: (hit_times.len() + failures.len()) as u64,
        total_failures: failures.len() as u64,
        uptime_percentage: percentage,
        online_duration_ms: online.num_milliseconds(),
        offline_duration_ms: offline.num_milliseconds(),
        periods,
    })
}
