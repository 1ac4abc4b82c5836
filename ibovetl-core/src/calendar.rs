//! Trading-day resolution for the B3 calendar.
//!
//! The scraper always targets the *previous completed* trading day: the index
//! composition for a session is only final after the close, so a run on any
//! given day lands the last business day strictly before it.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Fixed-date Brazilian national holidays as (month, day).
///
/// Movable feasts (Carnival, Good Friday, Corpus Christi) shift with Easter
/// and are supplied through configuration instead of being computed here.
const BRAZIL_FIXED_HOLIDAYS: [(u32, u32); 9] = [
    (1, 1),   // Confraternização Universal
    (4, 21),  // Tiradentes
    (5, 1),   // Dia do Trabalho
    (9, 7),   // Independência
    (10, 12), // Nossa Senhora Aparecida
    (11, 2),  // Finados
    (11, 15), // Proclamação da República
    (11, 20), // Consciência Negra
    (12, 25), // Natal
];

/// A finite set of non-trading calendar dates.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Calendar with no holidays; weekends are still excluded by the resolver.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Calendar seeded with the fixed Brazilian national holidays for an
    /// inclusive range of years.
    pub fn brazil(years: std::ops::RangeInclusive<i32>) -> Self {
        let mut dates = BTreeSet::new();
        for year in years {
            for (month, day) in BRAZIL_FIXED_HOLIDAYS {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    dates.insert(date);
                }
            }
        }
        Self { dates }
    }

    /// Add extra non-trading dates (movable feasts, exchange closures).
    pub fn with_dates(mut self, extra: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.dates.extend(extra);
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Most recent completed trading day strictly before `reference`.
///
/// Initial step back: 1 day for a Tue–Fri (or Saturday) reference, 3 for
/// Monday, 2 for Sunday. The candidate then walks back one day at a time
/// while it is a weekend or a holiday. Terminates for any finite holiday
/// set: weekdays recur with period 7.
pub fn previous_trading_day(reference: NaiveDate, holidays: &HolidayCalendar) -> NaiveDate {
    let step = match reference.weekday() {
        Weekday::Mon => 3,
        Weekday::Sun => 2,
        _ => 1,
    };

    let mut candidate = reference - Duration::days(step);
    while is_weekend(candidate) || holidays.contains(candidate) {
        candidate -= Duration::days(1);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn midweek_reference_steps_back_one_day() {
        // 2024-06-05 is a Wednesday
        let resolved = previous_trading_day(date(2024, 6, 5), &HolidayCalendar::empty());
        assert_eq!(resolved, date(2024, 6, 4));
    }

    #[test]
    fn monday_reference_resolves_to_friday() {
        // 2024-06-03 is a Monday
        let resolved = previous_trading_day(date(2024, 6, 3), &HolidayCalendar::empty());
        assert_eq!(resolved, date(2024, 5, 31));
        assert_eq!(resolved.weekday(), Weekday::Fri);
    }

    #[test]
    fn weekend_references_resolve_to_friday() {
        // 2024-06-01/02 are Saturday/Sunday
        let calendar = HolidayCalendar::empty();
        assert_eq!(
            previous_trading_day(date(2024, 6, 1), &calendar),
            date(2024, 5, 31)
        );
        assert_eq!(
            previous_trading_day(date(2024, 6, 2), &calendar),
            date(2024, 5, 31)
        );
    }

    #[test]
    fn holiday_on_candidate_walks_further_back() {
        // 2024-05-02 is a Thursday; declare 2024-05-01 (Wednesday, Dia do
        // Trabalho) a holiday so the resolver must reach Tuesday.
        let calendar = HolidayCalendar::brazil(2024..=2024);
        let resolved = previous_trading_day(date(2024, 5, 2), &calendar);
        assert_eq!(resolved, date(2024, 4, 30));
    }

    #[test]
    fn holiday_run_over_a_weekend() {
        // Monday 2023-12-25 (Natal) is a holiday: a Tuesday reference steps
        // to Monday, then walks back over the weekend to Friday.
        let calendar = HolidayCalendar::brazil(2023..=2023);
        let resolved = previous_trading_day(date(2023, 12, 26), &calendar);
        assert_eq!(resolved, date(2023, 12, 22));
        assert_eq!(resolved.weekday(), Weekday::Fri);
    }

    #[test]
    fn extra_dates_extend_the_calendar() {
        // Treat 2024-02-12/13 (Carnival, Mon/Tue) as holidays.
        let calendar = HolidayCalendar::brazil(2024..=2024)
            .with_dates([date(2024, 2, 12), date(2024, 2, 13)]);
        let resolved = previous_trading_day(date(2024, 2, 14), &calendar);
        assert_eq!(resolved, date(2024, 2, 9));
    }

    #[test]
    fn resolved_day_is_always_a_business_day_before_the_reference() {
        let calendar = HolidayCalendar::brazil(2024..=2024);
        let mut reference = date(2024, 1, 1);
        while reference < date(2025, 1, 1) {
            let resolved = previous_trading_day(reference, &calendar);
            assert!(resolved < reference);
            assert!(!is_weekend(resolved));
            assert!(!calendar.contains(resolved));
            reference += Duration::days(1);
        }
    }
}
