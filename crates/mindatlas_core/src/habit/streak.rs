//! Consecutive-day streak calculation.
//!
//! # Invariants
//! - A streak must end today or yesterday; older runs count as 0.
//! - Same-day duplicates neither extend nor break a streak.
//! - The reference day is explicit so results are reproducible.

use chrono::{Local, NaiveDate};

/// Counts consecutive completion days ending at `today` or the day before.
pub fn calculate_streak<'a, I>(completed_dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = &'a NaiveDate>,
{
    let mut days: Vec<NaiveDate> = completed_dates.into_iter().copied().collect();
    days.sort_unstable_by(|left, right| right.cmp(left));

    let Some(&most_recent) = days.first() else {
        return 0;
    };
    let yesterday = today.pred_opt();
    if most_recent != today && Some(most_recent) != yesterday {
        return 0;
    }

    let mut streak = 1;
    let mut last_counted = most_recent;
    for day in days.into_iter().skip(1) {
        if day == last_counted {
            continue;
        }
        if last_counted.pred_opt() == Some(day) {
            streak += 1;
            last_counted = day;
        } else {
            break;
        }
    }
    streak
}

/// Same as [`calculate_streak`] using the local calendar day.
pub fn current_streak<'a, I>(completed_dates: I) -> u32
where
    I: IntoIterator<Item = &'a NaiveDate>,
{
    calculate_streak(completed_dates, Local::now().date_naive())
}
