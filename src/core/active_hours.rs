use chrono::{DateTime, Local, NaiveTime};
use chrono_tz::Tz;
use std::fmt;

use crate::utils::error::{AppError, Result};

/// Time-of-day window outside which polling is suppressed.
///
/// Both ends are inclusive. A window whose start is not before its end wraps
/// past midnight (e.g. `22:00`-`06:00`). Times are read in the configured zone,
/// or the host's local zone when none is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    start: NaiveTime,
    end: NaiveTime,
    timezone: Option<Tz>,
}

impl ActiveHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_time(start)?, parse_time(end)?))
    }

    pub fn is_active_at(&self, now: DateTime<Local>) -> bool {
        let time = match self.timezone {
            Some(tz) => now.with_timezone(&tz).time(),
            None => now.time(),
        };
        self.contains(time)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start < self.end {
            time >= self.start && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

impl fmt::Display for ActiveHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))?;
        if let Some(tz) = self.timezone {
            write!(f, " ({})", tz.name())?;
        }
        Ok(())
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| AppError::Validation(format!("Invalid time of day: '{}'", value)))
}

/// IANA zone name such as `Europe/Istanbul`.
pub fn parse_timezone(value: &str) -> Result<Tz> {
    let value = value.trim();
    value
        .parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown timezone: '{}'", value)))
}
