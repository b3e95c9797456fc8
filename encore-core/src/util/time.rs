use std::{str::FromStr, time::Duration};

use thiserror::Error;

/// Formats a duration as `mm:ss`, or `hh:mm:ss` once it reaches an hour.
pub fn fmt_time(duration: Duration) -> String {
    let total = duration.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);

    if minutes >= 60 {
        format!("{:02}:{:02}:{:02}", minutes / 60, minutes % 60, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeekError {
    #[error("Timestamp is empty")]
    Empty,
    #[error("Invalid timestamp: {0}")]
    Invalid(String),
}

/// Where a seek should land, as typed by a user.
///
/// Accepts `90`, `01:30`, `1:02:03`, and relative forms like `+30` or `-1:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekTarget {
    Absolute(Duration),
    Forward(Duration),
    Backward(Duration),
}

impl SeekTarget {
    /// Returns the absolute offset to seek to, given the current position.
    pub fn resolve(&self, position: Duration) -> Duration {
        match *self {
            Self::Absolute(offset) => offset,
            Self::Forward(offset) => position.saturating_add(offset),
            Self::Backward(offset) => position.saturating_sub(offset),
        }
    }
}

impl FromStr for SeekTarget {
    type Err = SeekError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();

        if input.is_empty() {
            return Err(SeekError::Empty);
        }

        let (make, rest): (fn(Duration) -> Self, &str) = if let Some(rest) = input.strip_prefix('+') {
            (Self::Forward, rest)
        } else if let Some(rest) = input.strip_prefix('-') {
            (Self::Backward, rest)
        } else {
            (Self::Absolute, input)
        };

        let parts: Vec<_> = rest.split(':').collect();

        if parts.len() > 3 {
            return Err(SeekError::Invalid(input.to_string()));
        }

        let invalid = || SeekError::Invalid(input.to_string());
        let mut seconds: u64 = 0;

        for (unit, part) in [1u64, 60, 3600].into_iter().zip(parts.into_iter().rev()) {
            let value: u64 = part.parse().map_err(|_| invalid())?;

            seconds = value
                .checked_mul(unit)
                .and_then(|s| seconds.checked_add(s))
                .ok_or_else(invalid)?;
        }

        Ok(make(Duration::from_secs(seconds)))
    }
}
