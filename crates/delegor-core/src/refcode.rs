use chrono::{Datelike, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique, day-scoped tracking token correlating a request with its
/// replies and descendants. Format: `CTX-YYYY-MMDD-NNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceCode(String);

impl ReferenceCode {
    /// Wraps an existing code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the code has the `CTX-YYYY-MMDD-NNN` shape.
    pub fn is_well_formed(&self) -> bool {
        let mut parts = self.0.split('-');
        let (Some(prefix), Some(year), Some(monthday), Some(seq), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        prefix == "CTX"
            && year.len() == 4
            && year.chars().all(|c| c.is_ascii_digit())
            && monthday.len() == 4
            && monthday.chars().all(|c| c.is_ascii_digit())
            && seq.len() >= 3
            && seq.chars().all(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct DayCounter {
    day: NaiveDate,
    counter: u32,
}

/// Issues unique, monotonically increasing reference codes.
///
/// The sequence number is scoped to the UTC day and resets at rollover.
pub struct ReferenceCodeGenerator {
    state: Mutex<DayCounter>,
}

impl ReferenceCodeGenerator {
    /// Creates a generator starting from the current UTC day.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DayCounter {
                day: Utc::now().date_naive(),
                counter: 0,
            }),
        }
    }

    /// Generates the next code for the current UTC day.
    pub fn generate(&self) -> ReferenceCode {
        self.generate_on(Utc::now().date_naive())
    }

    fn generate_on(&self, today: NaiveDate) -> ReferenceCode {
        let mut state = self.state.lock();
        if state.day != today {
            state.day = today;
            state.counter = 0;
        }
        state.counter += 1;
        ReferenceCode(format!(
            "CTX-{:04}-{:02}{:02}-{:03}",
            today.year(),
            today.month(),
            today.day(),
            state.counter
        ))
    }
}

impl Default for ReferenceCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
