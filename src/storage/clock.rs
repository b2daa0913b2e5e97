//! Monotonic timestamp source
//!
//! Stored timestamps are compared as text, so two writes in the same
//! microsecond would tie. Each stamp from a clock is strictly later than
//! the one before it.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Clock {
    last_micros: Arc<AtomicI64>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, bumped past the previous stamp if needed
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let prev = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or(wall);
        let micros = wall.max(prev + 1);
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}

/// Fixed-width RFC 3339 text, so lexical order is chronological order
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidData(format!("bad timestamp '{}': {}", s, e)))
}
