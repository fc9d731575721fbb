use chrono::NaiveDate;

use crate::database::models::DailyDelta;
use crate::domain::models::{CumulativeStats, DeltaBasis};

/// Compute today's delta row for a player from freshly fetched cumulative
/// totals.
///
/// Deltas come strictly from the difference between consecutive cumulative
/// totals; nothing is accumulated independently. A counter reset upstream
/// therefore produces a negative delta, which is stored as-is.
///
/// `inflate_zero_play_wins` preserves a legacy display rule: when a day shows
/// wins without plays, the stored play count is coerced to 1.
pub fn compute_daily_delta(
    pid: &str,
    stat_date: NaiveDate,
    new: CumulativeStats,
    basis: DeltaBasis,
    inflate_zero_play_wins: bool,
) -> DailyDelta {
    match basis {
        DeltaBasis::FirstObservation => first_observation(pid, stat_date, new),
        DeltaBasis::DeltaFrom(prev) => {
            delta_from(pid, stat_date, new, prev, inflate_zero_play_wins)
        }
    }
}

fn first_observation(pid: &str, stat_date: NaiveDate, new: CumulativeStats) -> DailyDelta {
    DailyDelta {
        pid: pid.to_string(),
        stat_date,
        wins: 0,
        plays: 0,
        win_rate: 0.0,
        rating: new.rating,
        rating_change: 0,
        wins_total: new.wins_total,
        plays_total: new.plays_total,
    }
}

fn delta_from(
    pid: &str,
    stat_date: NaiveDate,
    new: CumulativeStats,
    prev: CumulativeStats,
    inflate_zero_play_wins: bool,
) -> DailyDelta {
    let wins = new.wins_total - prev.wins_total;
    let mut plays = new.plays_total - prev.plays_total;

    let win_rate = if plays == 0 {
        if wins > 0 && inflate_zero_play_wins {
            plays = 1;
        }
        0.0
    } else {
        round2(wins as f64 / plays as f64)
    };

    DailyDelta {
        pid: pid.to_string(),
        stat_date,
        wins,
        plays,
        win_rate,
        rating: new.rating,
        rating_change: new.rating - prev.rating,
        wins_total: new.wins_total,
        plays_total: new.plays_total,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn stats(rating: i64, wins_total: i64, plays_total: i64) -> CumulativeStats {
        CumulativeStats {
            rating,
            wins_total,
            plays_total,
        }
    }

    #[test]
    fn first_observation_yields_zero_deltas() {
        let delta = compute_daily_delta(
            "P1",
            day(),
            stats(1000, 7, 12),
            DeltaBasis::FirstObservation,
            true,
        );

        assert_eq!(delta.wins, 0);
        assert_eq!(delta.plays, 0);
        assert_eq!(delta.win_rate, 0.0);
        assert_eq!(delta.rating_change, 0);
        assert_eq!(delta.rating, 1000);
        assert_eq!(delta.wins_total, 7);
        assert_eq!(delta.plays_total, 12);
    }

    #[test]
    fn delta_arithmetic_from_consecutive_totals() {
        let prev = stats(1500, 10, 20);
        let new = stats(1600, 15, 25);

        let delta = compute_daily_delta("P1", day(), new, DeltaBasis::DeltaFrom(prev), true);

        assert_eq!(delta.wins, 5);
        assert_eq!(delta.plays, 5);
        assert_eq!(delta.win_rate, 1.0);
        assert_eq!(delta.rating_change, 100);
        assert_eq!(delta.rating, 1600);
        assert_eq!(delta.wins_total, 15);
        assert_eq!(delta.plays_total, 25);
    }

    #[test]
    fn zero_plays_forces_zero_win_rate() {
        let prev = stats(1500, 10, 20);
        let new = stats(1500, 10, 20);

        let delta = compute_daily_delta("P1", day(), new, DeltaBasis::DeltaFrom(prev), true);

        assert_eq!(delta.wins, 0);
        assert_eq!(delta.plays, 0);
        assert_eq!(delta.win_rate, 0.0);
    }

    #[test]
    fn wins_without_plays_inflate_play_count_when_enabled() {
        // Legacy rule: the source can report a win before the matching play
        // shows up; the stored play count is bumped to 1 for that day.
        let prev = stats(1500, 10, 20);
        let new = stats(1510, 11, 20);

        let delta = compute_daily_delta("P1", day(), new, DeltaBasis::DeltaFrom(prev), true);

        assert_eq!(delta.wins, 1);
        assert_eq!(delta.plays, 1);
        assert_eq!(delta.win_rate, 0.0);
    }

    #[test]
    fn wins_without_plays_stay_untouched_when_policy_disabled() {
        let prev = stats(1500, 10, 20);
        let new = stats(1510, 11, 20);

        let delta = compute_daily_delta("P1", day(), new, DeltaBasis::DeltaFrom(prev), false);

        assert_eq!(delta.wins, 1);
        assert_eq!(delta.plays, 0);
        assert_eq!(delta.win_rate, 0.0);
    }

    #[test]
    fn counter_reset_passes_through_as_negative_delta() {
        let prev = stats(1500, 10, 20);
        let new = stats(1200, 2, 4);

        let delta = compute_daily_delta("P1", day(), new, DeltaBasis::DeltaFrom(prev), true);

        assert_eq!(delta.wins, -8);
        assert_eq!(delta.plays, -16);
        assert_eq!(delta.rating_change, -300);
        assert_eq!(delta.win_rate, 0.5);
    }

    #[test]
    fn win_rate_rounds_to_two_decimals() {
        let prev = stats(1500, 0, 0);
        let new = stats(1500, 1, 3);

        let delta = compute_daily_delta("P1", day(), new, DeltaBasis::DeltaFrom(prev), true);

        assert_eq!(delta.win_rate, 0.33);
    }
}
