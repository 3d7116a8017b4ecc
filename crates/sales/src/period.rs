//! Inclusive calendar periods for sales reporting.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use agristore_core::{DomainError, DomainResult};

/// Inclusive date range. `end` is the last instant of the `to` day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    from: NaiveDate,
    to: NaiveDate,
}

impl Period {
    pub fn new(from: NaiveDate, to: NaiveDate) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::validation(format!(
                "from date {from} is after to date {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// The calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        Self {
            from: first_of_month(day),
            to: last_of_month(day),
        }
    }

    /// Fill in missing bounds.
    ///
    /// Neither bound: the month containing `today`. Only `from`: up to the end
    /// of `today`'s month. Only `to`: from the first day of `to`'s month.
    pub fn resolve(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> DomainResult<Self> {
        match (from, to) {
            (None, None) => Ok(Self::month_of(today)),
            (Some(from), None) => Self::new(from, last_of_month(today)),
            (None, Some(to)) => Self::new(first_of_month(to), to),
            (Some(from), Some(to)) => Self::new(from, to),
        }
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    pub fn start(&self) -> DateTime<Utc> {
        start_of_day(self.from)
    }

    pub fn end(&self) -> DateTime<Utc> {
        end_of_day(self.to)
    }

    /// `"YYYY-MM-DD to YYYY-MM-DD"`.
    pub fn label(&self) -> String {
        format!("{} to {}", self.from.format("%Y-%m-%d"), self.to.format("%Y-%m-%d"))
    }
}

pub fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59 and every fraction of that last second.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::nanoseconds(1)
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn last_of_month(day: NaiveDate) -> NaiveDate {
    let first = first_of_month(day);
    let next = first.checked_add_months(chrono::Months::new(1)).unwrap_or(first);
    next.pred_opt().unwrap_or(day)
}
