use chrono::Local;

/// `strftime` pattern of every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length of a formatted timestamp (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_LEN: usize = 19;

/// Source of wall-clock timestamps.
///
/// Every implementation returns the fixed-width, zero-padded format above,
/// which is what makes lexicographic date comparisons valid.
pub trait Clock {
    fn now(&self) -> String;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Clock pinned to one instant. Handy for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_system_clock_format() {
        let now = SystemClock.now();
        assert_eq!(now.len(), TIMESTAMP_LEN);
        assert!(
            NaiveDateTime::parse_from_str(&now, TIMESTAMP_FORMAT).is_ok(),
            "unexpected timestamp {now}"
        );
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new("2024-01-05 10:00:00");
        assert_eq!(clock.now(), "2024-01-05 10:00:00");
        assert_eq!(clock.now(), clock.now());
    }
}
