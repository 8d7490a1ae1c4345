//! Time-of-day buckets for medication records.

use chrono::Timelike;

use crate::clock::Clock;
use crate::models::TimePeriod;

impl TimePeriod {
    /// Bucket for an hour of day: [5,12) morning, [12,17) afternoon,
    /// [17,21) evening, anything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Japanese label shown and spoken to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "朝",
            Self::Afternoon => "昼",
            Self::Evening => "夕方",
            Self::Night => "夜",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Self::Morning => "おはようございます。朝の服薬時間ですね。",
            Self::Afternoon => "こんにちは。昼の服薬時間ですね。",
            Self::Evening => "こんばんは。夕方の服薬時間ですね。",
            Self::Night => "お疲れさまです。夜の服薬時間ですね。",
        }
    }
}

/// Time period for the clock's current local hour.
pub fn current_time_period(clock: &dyn Clock) -> TimePeriod {
    TimePeriod::from_hour(clock.now().hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Local, TimeZone};

    #[test]
    fn boundary_hours() {
        assert_eq!(TimePeriod::from_hour(5), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(11), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(12), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(16), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(17), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(20), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(21), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(4), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(0), TimePeriod::Night);
    }

    #[test]
    fn hours_partition_the_day() {
        let mut counts = std::collections::HashMap::new();
        for hour in 0..24 {
            *counts.entry(TimePeriod::from_hour(hour)).or_insert(0) += 1;
        }
        assert_eq!(counts[&TimePeriod::Morning], 7);
        assert_eq!(counts[&TimePeriod::Afternoon], 5);
        assert_eq!(counts[&TimePeriod::Evening], 4);
        assert_eq!(counts[&TimePeriod::Night], 8);
        assert_eq!(counts.values().sum::<i32>(), 24);
    }

    #[test]
    fn out_of_range_hour_is_night() {
        assert_eq!(TimePeriod::from_hour(24), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(u32::MAX), TimePeriod::Night);
    }

    #[test]
    fn labels_and_greetings() {
        assert_eq!(TimePeriod::Evening.label(), "夕方");
        assert_eq!(TimePeriod::Afternoon.label(), "昼");
        assert!(TimePeriod::Morning.greeting().starts_with("おはようございます"));
        assert!(TimePeriod::Night.greeting().contains("夜の服薬時間"));
    }

    #[test]
    fn current_period_uses_local_hour() {
        let clock = FixedClock(Local.with_ymd_and_hms(2026, 10, 16, 18, 45, 0).unwrap());
        assert_eq!(current_time_period(&clock), TimePeriod::Evening);
    }
}
