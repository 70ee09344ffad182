//! Rental window resolution
//!
//! Turns the request's dates and optional wall-clock times into the
//! effective half-open interval that availability and pricing work on.
//!
//! Hourly rentals combine `start_time` with the start date and `end_time`
//! with the end date, so an hourly hire may cross midnight (and run past
//! 24 hours). Without both times the rental is priced by the day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::domain::{DomainError, DomainResult};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// Priced per hour rather than per day
    pub hourly: bool,
}

impl RentalWindow {
    pub fn resolve(
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
        hourly: bool,
    ) -> DomainResult<Self> {
        let window = match (hourly, start_time, end_time) {
            (true, Some(st), Some(et)) => Self {
                start: at_time(start_date.date_naive(), st),
                end: at_time(end_date.date_naive(), et),
                start_time: Some(st),
                end_time: Some(et),
                hourly: true,
            },
            _ => Self {
                start: start_date,
                end: end_date,
                start_time,
                end_time,
                hourly: false,
            },
        };

        if window.end <= window.start {
            return Err(DomainError::InvalidInput(if window.hourly {
                "End time must be after start time".to_string()
            } else {
                "End date must be after start date".to_string()
            }));
        }
        Ok(window)
    }

    /// Reservations must start strictly after `now`.
    pub fn ensure_future(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.start <= now {
            return Err(DomainError::InvalidInput(
                "Start date must be in the future".to_string(),
            ));
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Billable days, partial days rounded up
    pub fn total_days(&self) -> i64 {
        ceil_units(self.duration(), MILLIS_PER_DAY)
    }

    /// Billable hours, partial hours rounded up
    pub fn total_hours(&self) -> i64 {
        ceil_units(self.duration(), MILLIS_PER_HOUR)
    }
}

fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

fn ceil_units(duration: Duration, unit_millis: i64) -> i64 {
    let millis = duration.num_milliseconds().max(1);
    (millis + unit_millis - 1) / unit_millis
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, d, 0, 0, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn daily_window_rounds_partial_days_up() {
        let w = RentalWindow::resolve(day(1), day(4), None, None, false).unwrap();
        assert!(!w.hourly);
        assert_eq!(w.total_days(), 3);

        let w = RentalWindow::resolve(day(1), day(4) + Duration::minutes(1), None, None, false)
            .unwrap();
        assert_eq!(w.total_days(), 4);
    }

    #[test]
    fn hourly_window_combines_dates_with_times() {
        let w = RentalWindow::resolve(day(1), day(1), Some(hm(9, 0)), Some(hm(12, 30)), true)
            .unwrap();
        assert!(w.hourly);
        assert_eq!(w.start, day(1) + Duration::hours(9));
        assert_eq!(w.end, day(1) + Duration::minutes(12 * 60 + 30));
        assert_eq!(w.total_hours(), 4);
    }

    #[test]
    fn hourly_window_may_cross_midnight() {
        let w = RentalWindow::resolve(day(1), day(2), Some(hm(9, 0)), Some(hm(10, 0)), true)
            .unwrap();
        assert_eq!(w.total_hours(), 25);

        let w = RentalWindow::resolve(day(1), day(2), Some(hm(22, 0)), Some(hm(2, 0)), true)
            .unwrap();
        assert_eq!(w.total_hours(), 4);
    }

    #[test]
    fn same_day_hourly_end_must_follow_start() {
        let err = RentalWindow::resolve(day(1), day(1), Some(hm(12, 0)), Some(hm(9, 0)), true)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn hourly_without_times_falls_back_to_days() {
        let w = RentalWindow::resolve(day(1), day(3), Some(hm(9, 0)), None, true).unwrap();
        assert!(!w.hourly);
        assert_eq!(w.total_days(), 2);
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert!(RentalWindow::resolve(day(3), day(1), None, None, false).is_err());
        assert!(RentalWindow::resolve(day(3), day(3), None, None, false).is_err());
    }

    #[test]
    fn start_must_be_strictly_future() {
        let w = RentalWindow::resolve(day(2), day(3), None, None, false).unwrap();
        assert!(w.ensure_future(day(1)).is_ok());
        assert!(w.ensure_future(day(2)).is_err());
    }
}
