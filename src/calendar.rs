//! Mapping of heatmap cells to commit timestamps.
//!
//! Week 0, day 0 is a reference Sunday. Every other cell is that many
//! calendar days later, at a fixed local time of day.

use std::fmt;

use chrono::{
    DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta,
    TimeZone,
};

use crate::error::CalendarError;
use crate::raster::{GridCoordinate, DAYS_PER_WEEK};

fn next_sunday(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let ahead = (7 - date.weekday().num_days_from_sunday()) % 7;
    date.checked_add_days(Days::new(u64::from(ahead)))
        .ok_or(CalendarError::OutOfRange)
}

/// First Sunday on or after January 7 of `year`.
pub fn reference_for_year(year: i32) -> Result<NaiveDate, CalendarError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 7).ok_or(CalendarError::InvalidYear(year))?;
    next_sunday(start)
}

/// First Sunday of the year-long window ending at `today`.
///
/// The window starts 366 days back when the previous year was a leap year
/// and 365 days back otherwise, so the drawing fits a trailing twelve month
/// heatmap.
pub fn reference_trailing(today: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let previous_leap =
        NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).is_some_and(|d| d.leap_year());
    let days_back = if previous_leap { 366 } else { 365 };
    let start = today
        .checked_sub_days(Days::new(days_back))
        .ok_or(CalendarError::OutOfRange)?;
    next_sunday(start)
}

/// Converts grid coordinates into timestamps in time zone `Tz`.
#[derive(Debug, Clone)]
pub struct CalendarMapper<Tz: TimeZone> {
    reference: NaiveDate,
    time: NaiveTime,
    tz: Tz,
}

impl CalendarMapper<Local> {
    /// Mapper in the system time zone with commits at `hour`:00.
    pub fn local(reference: NaiveDate, hour: u32) -> Result<Self, CalendarError> {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or(CalendarError::InvalidHour(hour))?;
        Ok(Self::new(reference, time, Local))
    }
}

impl<Tz: TimeZone> CalendarMapper<Tz> {
    pub fn new(reference: NaiveDate, time: NaiveTime, tz: Tz) -> Self {
        Self {
            reference,
            time,
            tz,
        }
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn date(&self, coord: GridCoordinate) -> Result<NaiveDate, CalendarError> {
        let days = u64::from(coord.week) * u64::from(DAYS_PER_WEEK) + u64::from(coord.day);
        self.reference
            .checked_add_days(Days::new(days))
            .ok_or(CalendarError::OutOfRange)
    }

    /// The instant for `coord`. A local time skipped by a DST transition
    /// moves forward one hour; an ambiguous one takes the earlier instant.
    pub fn timestamp(&self, coord: GridCoordinate) -> Result<DateTime<Tz>, CalendarError> {
        let naive = self.date(coord)?.and_time(self.time);
        self.resolve(naive)
            .or_else(|| {
                naive
                    .checked_add_signed(TimeDelta::hours(1))
                    .and_then(|later| self.resolve(later))
            })
            .ok_or(CalendarError::NonexistentTime(naive))
    }

    fn resolve(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        self.tz.from_local_datetime(&naive).earliest()
    }
}

impl<Tz: TimeZone> CalendarMapper<Tz>
where
    Tz::Offset: fmt::Display,
{
    /// RFC 3339 timestamp with an explicit offset, e.g.
    /// `2024-01-07T12:00:00+01:00`.
    pub fn iso8601(&self, coord: GridCoordinate) -> Result<String, CalendarError> {
        Ok(self.timestamp(coord)?.to_rfc3339_opts(SecondsFormat::Secs, false))
    }
}
