use chrono::{DateTime, Utc};

/// Time source for everything that compares against "now" (grant expiry,
/// device activity, signed URL timestamps). Injected so tests can freeze
/// and advance time without touching rows.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub struct MockClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl MockClock {
    pub fn at(rfc3339: &str) -> Self {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid RFC 3339")
            .with_timezone(&Utc);
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_is_frozen_until_advanced() {
        let clock = MockClock::at("2025-06-01T00:00:00Z");
        assert_eq!(clock.now_utc().to_rfc3339(), "2025-06-01T00:00:00+00:00");
        clock.advance(chrono::Duration::days(3));
        assert_eq!(clock.now_utc().to_rfc3339(), "2025-06-04T00:00:00+00:00");
    }
}
