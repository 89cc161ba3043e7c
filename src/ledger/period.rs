//! Calendar months as the unit of aggregation.

use std::fmt::Display;

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use time::{Date, Month, util::days_in_year_month};

use crate::Error;

/// The earliest year accepted for a [Period].
pub const MIN_YEAR: i32 = 1;
/// The latest year accepted for a [Period].
pub const MAX_YEAR: i32 = 9999;

/// A calendar month of a specific year, e.g. March 2024.
///
/// Periods order chronologically: by year first, then by month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u8,
}

impl Period {
    /// Create a period from a year and a month number (1 = January).
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if `month` is outside 1..=12 or `year`
    /// is outside [MIN_YEAR]..=[MAX_YEAR].
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(Error::InvalidPeriod { year, month });
        }

        Ok(Self { year, month })
    }

    /// The period that contains `date`, i.e. `date` truncated to its month.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    /// The year of the period.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number of the period, 1 = January.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Shift the period by `months` calendar months, rolling over year
    /// boundaries in either direction.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if the shifted month falls outside
    /// [MIN_YEAR]..=[MAX_YEAR].
    pub fn shift(self, months: i32) -> Result<Self, Error> {
        let index = self.year * 12 + (self.month as i32 - 1) + months;

        Self::new(index.div_euclid(12), (index.rem_euclid(12) + 1) as u8)
    }

    /// The month immediately before this one.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] for January of [MIN_YEAR].
    pub fn previous(self) -> Result<Self, Error> {
        self.shift(-1)
    }

    /// The first day of the period.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the period lies outside the range of
    /// representable dates.
    pub fn first_day(&self) -> Result<Date, Error> {
        self.day(1)
    }

    /// The last day of the period, accounting for leap years.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the period lies outside the range of
    /// representable dates.
    pub fn last_day(&self) -> Result<Date, Error> {
        let month = self.time_month()?;
        self.day(days_in_year_month(self.year, month))
    }

    /// The date with the given day of month in this period, clamped to the
    /// last day of the month, e.g. day 31 of February 2024 is 2024-02-29.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the period lies outside the range of
    /// representable dates.
    pub fn clamped_day(&self, day: u8) -> Result<Date, Error> {
        let month = self.time_month()?;
        self.day(day.clamp(1, days_in_year_month(self.year, month)))
    }

    fn day(&self, day: u8) -> Result<Date, Error> {
        Date::from_calendar_date(self.year, self.time_month()?, day)
            .map_err(|error| Error::InvalidDate(error.to_string()))
    }

    fn time_month(&self) -> Result<Month, Error> {
        Month::try_from(self.month).map_err(|error| Error::InvalidDate(error.to_string()))
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The query string used by the reporting routes, e.g. `?month=3&year=2024`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodQuery {
    /// The month number, 1 = January.
    pub month: u8,
    /// The year.
    pub year: i32,
}

impl TryFrom<PeriodQuery> for Period {
    type Error = Error;

    fn try_from(query: PeriodQuery) -> Result<Self, Self::Error> {
        Period::new(query.year, query.month)
    }
}

impl<S> FromRequestParts<S> for Period
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PeriodQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::InvalidQuery(rejection.body_text()))?;

        Period::try_from(query)
    }
}
