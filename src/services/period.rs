use chrono::{
    DateTime,
    Datelike,
    Duration,
    FixedOffset,
    Months,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    TimeZone,
    Utc,
};
use serde::Serialize;

use crate::enums::SettlementPeriod;
use crate::error::{ AppError, Result };

/// Earliest date the `all` period reaches back to.
const EPOCH_YEAR: i32 = 2020;

/// Inclusive UTC bounds of a settlement query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SettlementWindow {
    /// Resolves the query window. Explicit dates win over the named period,
    /// but only when both are supplied.
    pub fn resolve(
        period: SettlementPeriod,
        start_date: Option<&str>,
        end_date: Option<&str>,
        now: DateTime<Utc>,
        offset: FixedOffset
    ) -> Result<Self> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            let start = parse_bound(start, offset, Bound::Start)
                .ok_or_else(|| AppError::InvalidInput(format!("Invalid startDate: {}", start)))?;
            let end = parse_bound(end, offset, Bound::End)
                .ok_or_else(|| AppError::InvalidInput(format!("Invalid endDate: {}", end)))?;

            if start > end {
                return Err(AppError::InvalidInput("startDate must not be after endDate".to_string()));
            }

            return Ok(Self { start, end });
        }

        let today = local_date(now, offset);

        let (first, last) = match period {
            SettlementPeriod::Today => (today, today),
            SettlementPeriod::Week => {
                let first = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                (first, first + Duration::days(6))
            }
            SettlementPeriod::Month => {
                let first = ymd(today.year(), today.month(), 1)?;
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(|| AppError::Internal("Calendar overflow".to_string()))?;
                (first, last)
            }
            SettlementPeriod::Year => (ymd(today.year(), 1, 1)?, ymd(today.year(), 12, 31)?),
            SettlementPeriod::All => (ymd(EPOCH_YEAR, 1, 1)?, ymd(today.year() + 1, 12, 31)?),
        };

        Ok(Self {
            start: local_to_utc(first.and_time(NaiveTime::MIN), offset),
            end: local_to_utc(end_of_day(last), offset),
        })
    }
}

/// UTC instant of the most recent local midnight.
pub fn local_day_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    local_to_utc(local_date(now, offset).and_time(NaiveTime::MIN), offset)
}

fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let naive_utc = local - Duration::seconds(offset.local_minus_utc() as i64);
    Utc.from_utc_datetime(&naive_utc)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1)
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppError::Internal(format!("Invalid calendar date {}-{}-{}", year, month, day))
    })
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain end date
/// covers the whole local day.
fn parse_bound(raw: &str, offset: FixedOffset, bound: Bound) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let local = match bound {
        Bound::Start => date.and_time(NaiveTime::MIN),
        Bound::End => end_of_day(date),
    };

    Some(local_to_utc(local, offset))
}
