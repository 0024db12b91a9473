//! Query parameters and default time windows.

use chrono::{DateTime, Datelike, Duration, SecondsFormat, TimeZone, Utc};

/// Ordered query parameters.
///
/// Setting an existing key replaces its value in place, so caller-supplied
/// keys keep their position and defaults are appended after them. Empty
/// values are skipped when the query string is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key` only if the caller has not supplied a non-empty value.
    pub fn set_default(&mut self, key: &str, value: impl Into<String>) {
        if self.get(key).is_none() {
            self.set(key, value);
        }
    }

    /// Non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    /// Apply a `since`/`until` window ending at `now` unless the caller
    /// already provided the bound.
    pub fn with_window(mut self, now: DateTime<Utc>, lookback: Duration) -> Self {
        self.set_default("since", iso(now - lookback));
        self.set_default("until", iso(now));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.iter().all(|(_, v)| v.is_empty())
    }

    /// Url-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .pairs
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.set(k, v);
        }
        params
    }
}

impl<const N: usize> From<[(&str, &str); N]> for QueryParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.set(k, v);
        }
        params
    }
}

/// Lookback windows applied when the caller gives no `since`.
pub mod windows {
    use chrono::Duration;

    pub fn zone_analytics() -> Duration {
        Duration::hours(24)
    }

    pub fn workers() -> Duration {
        Duration::hours(24)
    }

    pub fn firewall_events() -> Duration {
        Duration::hours(1)
    }

    pub fn ddos_events() -> Duration {
        Duration::days(7)
    }
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Midnight UTC of the first day of the month containing `now`.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
