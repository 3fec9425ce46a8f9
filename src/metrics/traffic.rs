use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};
use itertools::Itertools;
use serde::Serialize;

use crate::config::DayBoundary;
use crate::metrics::{RECENT_WINDOW_DAYS, ReferenceTime, window_start};
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUsers {
    pub last30_days: usize,
    pub last7_days: usize,
    pub today: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Traffic {
    pub new_users: NewUsers,
    /// `YYYY-MM-DD` -> signups that day. Days without signups are absent.
    pub daily_breakdown: BTreeMap<String, usize>,
}

/// The first instant of `now`'s calendar day in `zone`.
///
/// When local midnight doesn't exist (a DST gap), the day starts at the
/// first local time that does.
pub fn start_of_day<Tz: TimeZone>(now: &ReferenceTime, zone: &Tz) -> DateTime<Utc> {
    let midnight = now.with_timezone(zone).date_naive().and_time(NaiveTime::MIN);

    (0..=24 * 4)
        .map(|quarter| midnight + TimeDelta::minutes(15 * quarter))
        .find_map(|local| zone.from_local_datetime(&local).earliest())
        .map_or_else(|| midnight.and_utc(), |start| start.with_timezone(&Utc))
}

/// Signup counts over the trailing window, plus a per-day histogram whose
/// days begin at `boundary`.
pub fn traffic(users: &[User], now: &ReferenceTime, boundary: DayBoundary) -> Traffic {
    match boundary {
        DayBoundary::Local => traffic_in(users, now, &Local),
        DayBoundary::Utc => traffic_in(users, now, &Utc),
        DayBoundary::Fixed(offset) => traffic_in(users, now, &offset),
    }
}

/// [`traffic`] with calendar days taken in `zone`. Each signup is dated
/// with the offset in effect when it happened, not the one in effect now.
///
/// Users created before the window are ignored, so callers may pass either
/// every user or an already-filtered set.
pub fn traffic_in<Tz: TimeZone>(users: &[User], now: &ReferenceTime, zone: &Tz) -> Traffic {
    let month_start = window_start(now, RECENT_WINDOW_DAYS);
    let week_start = window_start(now, 7);
    let today_start = start_of_day(now, zone);

    let recent = users
        .iter()
        .filter(|u| u.created_at >= month_start)
        .collect_vec();

    let daily_breakdown = recent
        .iter()
        .counts_by(|u| u.created_at.with_timezone(zone).date_naive().format("%Y-%m-%d").to_string())
        .into_iter()
        .collect();

    Traffic {
        new_users: NewUsers {
            last30_days: recent.len(),
            last7_days: recent.iter().filter(|u| u.created_at >= week_start).count(),
            today: recent.iter().filter(|u| u.created_at >= today_start).count(),
        },
        daily_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::{self, days_ago, user};
    use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeDelta};

    fn created(id: i64, at: DateTime<Utc>) -> User {
        let mut u = user(id, &format!("u{id}"), 0, &[]);
        u.created_at = at;
        u
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// A zone that moves from `BEFORE` to `AFTER` (seconds east of UTC) at
    /// unix time `SWITCH` and never moves back.
    #[derive(Debug, Clone, Copy)]
    struct Switching<const SWITCH: i64, const BEFORE: i32, const AFTER: i32>;

    /// New York around 2024-03-10, when 02:00 EST became 03:00 EDT.
    type NewYork = Switching<1_710_054_000, { -5 * 3600 }, { -4 * 3600 }>;

    /// Clocks jump from 00:00 -03:00 to 01:00 -02:00 on 2024-09-08.
    type SkipsMidnight = Switching<1_725_764_400, { -3 * 3600 }, { -2 * 3600 }>;

    impl<const SWITCH: i64, const BEFORE: i32, const AFTER: i32> Switching<SWITCH, BEFORE, AFTER> {
        fn offset_at(utc: &NaiveDateTime) -> FixedOffset {
            let secs = if utc.and_utc().timestamp() < SWITCH { BEFORE } else { AFTER };
            FixedOffset::east_opt(secs).unwrap()
        }
    }

    impl<const SWITCH: i64, const BEFORE: i32, const AFTER: i32> TimeZone for Switching<SWITCH, BEFORE, AFTER> {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Self
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let fits = |offset: &FixedOffset| {
                Self::offset_at(&(*local - TimeDelta::seconds(offset.local_minus_utc().into()))) == *offset
            };
            let candidates = [BEFORE, AFTER]
                .map(|secs| FixedOffset::east_opt(secs).unwrap())
                .into_iter()
                .filter(fits)
                .collect_vec();

            match candidates.as_slice() {
                [offset] => LocalResult::Single(*offset),
                [earliest, latest] => LocalResult::Ambiguous(*earliest, *latest),
                _ => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            Self::offset_at(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            Self::offset_at(utc)
        }
    }

    #[test]
    fn rolling_counts_are_anchored_at_reference_time() {
        let users = [
            created(1, days_ago(0) - TimeDelta::hours(1)), // today, 11:00
            created(2, days_ago(0) - TimeDelta::hours(13)), // yesterday, 23:00
            created(3, days_ago(6)),
            created(4, days_ago(20)),
            created(5, days_ago(45)),
        ];

        let result = traffic(&users, &fixtures::now(), DayBoundary::Utc);

        assert_eq!(result.new_users, NewUsers { last30_days: 4, last7_days: 3, today: 1 });
    }

    #[test]
    fn daily_breakdown_omits_empty_days() {
        let users = [
            created(1, days_ago(0)),
            created(2, days_ago(0) - TimeDelta::hours(2)),
            created(3, days_ago(3)),
            created(4, days_ago(31)),
        ];

        let result = traffic(&users, &fixtures::now(), DayBoundary::Utc);

        assert_eq!(result.daily_breakdown.len(), 2);
        assert_eq!(result.daily_breakdown["2024-06-15"], 2);
        assert_eq!(result.daily_breakdown["2024-06-12"], 1);
        assert_eq!(result.daily_breakdown.values().sum::<usize>(), result.new_users.last30_days);
    }

    #[test]
    fn breakdown_keys_are_dates_inside_the_window() {
        let users: Vec<_> = (0..40).map(|d| created(d, days_ago(d))).collect();
        let now = fixtures::now();
        let result = traffic(&users, &now, DayBoundary::Utc);

        let earliest = window_start(&now, RECENT_WINDOW_DAYS).date_naive();
        for key in result.daily_breakdown.keys() {
            let day = NaiveDate::parse_from_str(key, "%Y-%m-%d").unwrap();
            assert!(day >= earliest && day <= now.date_naive(), "{key} outside window");
        }
        assert_eq!(result.daily_breakdown.values().sum::<usize>(), 31);
    }

    #[test]
    fn fixed_offset_boundary_shifts_days() {
        // 2024-06-15T12:00Z is 2024-06-16T01:00 at +13:00, so "today" started
        // at 2024-06-15T11:00Z.
        let now = DateTime::parse_from_rfc3339("2024-06-16T01:00:00+13:00").unwrap();
        let users = [
            created(1, days_ago(0) - TimeDelta::minutes(30)),
            created(2, days_ago(0) - TimeDelta::minutes(90)),
        ];

        let result = traffic(&users, &now, DayBoundary::Fixed(*now.offset()));

        assert_eq!(result.new_users.today, 1);
        assert_eq!(result.daily_breakdown["2024-06-16"], 1);
        assert_eq!(result.daily_breakdown["2024-06-15"], 1);
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let now = DateTime::parse_from_rfc3339("2024-06-15T08:30:00-04:00").unwrap();
        assert_eq!(start_of_day(&now, now.offset()).to_rfc3339(), "2024-06-15T04:00:00+00:00");
    }

    #[test]
    fn signups_before_a_dst_change_keep_their_own_local_day() {
        // 23:30 EST on March 8th. By the reference time New York is on EDT.
        let users = [created(1, utc("2024-03-09T04:30:00Z"))];
        let now = DateTime::parse_from_rfc3339("2024-03-20T16:00:00+00:00").unwrap();

        let result = traffic_in(&users, &now, &NewYork {});

        assert_eq!(result.daily_breakdown.len(), 1);
        assert_eq!(result.daily_breakdown.get("2024-03-08"), Some(&1));
    }

    #[test]
    fn today_starts_at_midnight_on_the_day_of_a_dst_change() {
        // 15:00 EDT on March 10th; midnight that day was still EST, 05:00Z.
        let now = DateTime::parse_from_rfc3339("2024-03-10T19:00:00+00:00").unwrap();
        let users = [
            created(1, utc("2024-03-10T04:30:00Z")), // 23:30 EST, March 9th
            created(2, utc("2024-03-10T05:30:00Z")), // 00:30 EST, March 10th
        ];

        assert_eq!(start_of_day(&now, &NewYork {}), utc("2024-03-10T05:00:00Z"));

        let result = traffic_in(&users, &now, &NewYork {});
        assert_eq!(result.new_users.today, 1);
        assert_eq!(result.daily_breakdown["2024-03-09"], 1);
        assert_eq!(result.daily_breakdown["2024-03-10"], 1);
    }

    #[test]
    fn skipped_midnight_starts_the_day_at_the_first_valid_time() {
        let now = DateTime::parse_from_rfc3339("2024-09-08T15:00:00+00:00").unwrap();
        assert_eq!(start_of_day(&now, &SkipsMidnight {}), utc("2024-09-08T03:00:00Z"));
    }
}
