//! Expansion of a recurring regimen into concrete dose instants.
//!
//! A regimen is a list of local times of day ("08:00", "20:30") applied to
//! every calendar day between an inclusive start and end date. Expansion is
//! computed in the deployment time zone and yields UTC instants, one per
//! (day, time) pair.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid dose time {0:?}: expected HH:MM between 00:00 and 23:59")]
    InvalidDoseTime(String),

    #[error("a regimen needs at least one dose time")]
    NoDoseTimes,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("schedule spans {days} days, more than the allowed {max_days}")]
    RangeTooLong { days: i64, max_days: i64 },
}

/// A local time of day at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DoseTime {
    hour: u32,
    minute: u32,
}

impl DoseTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidDoseTime(format!("{}:{}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    /// Parses "H:MM" or "HH:MM". Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let invalid = || ScheduleError::InvalidDoseTime(raw.to_string());
        let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }

    pub fn as_naive(&self) -> NaiveTime {
        // Range checked in `new`.
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for DoseTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DoseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse and normalise a list of dose times: sorted, duplicates removed.
pub fn parse_dose_times<S: AsRef<str>>(raw: &[S]) -> Result<Vec<DoseTime>, ScheduleError> {
    let mut times = raw
        .iter()
        .map(|t| DoseTime::parse(t.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    if times.is_empty() {
        return Err(ScheduleError::NoDoseTimes);
    }
    times.sort_unstable();
    times.dedup();
    Ok(times)
}

/// A bounded recurrence: every listed time on every day in `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoseSchedule {
    times: Vec<DoseTime>,
    start: NaiveDate,
    end: NaiveDate,
}

impl DoseSchedule {
    /// Build a schedule. The end date is mandatory: an open-ended regimen is
    /// never expanded.
    pub fn new<S: AsRef<str>>(
        times: &[S],
        start: NaiveDate,
        end: NaiveDate,
        max_days: i64,
    ) -> Result<Self, ScheduleError> {
        let times = parse_dose_times(times)?;
        if start > end {
            return Err(ScheduleError::InvalidDateRange { start, end });
        }
        let days = (end - start).num_days() + 1;
        if days > max_days {
            return Err(ScheduleError::RangeTooLong { days, max_days });
        }
        Ok(Self { times, start, end })
    }

    pub fn times(&self) -> &[DoseTime] {
        &self.times
    }

    /// Number of calendar days covered, inclusive.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every dose instant in the schedule, ascending and unique.
    pub fn expand(&self, tz: &Tz) -> Vec<DateTime<Utc>> {
        let mut instants = Vec::with_capacity(self.days() as usize * self.times.len());
        for day in self.start.iter_days().take_while(|d| *d <= self.end) {
            for time in &self.times {
                instants.push(resolve_local(tz, day.and_time(time.as_naive())));
            }
        }
        // A skipped DST hour can push one time onto another.
        instants.sort_unstable();
        instants.dedup();
        instants
    }

    /// Dose instants strictly after `after`.
    pub fn expand_after(&self, tz: &Tz, after: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.expand(tz).into_iter().filter(|at| *at > after).collect()
    }
}

/// Map a wall-clock time to an instant. Ambiguous times (clocks going back)
/// take the earlier instant; non-existent times (clocks going forward) are
/// moved forward by an hour.
pub fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => at.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}
