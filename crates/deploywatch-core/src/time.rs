use chrono::{DateTime, Utc};

/// Coarse "time ago" text: minutes under an hour, hours under a day, then days.
/// Instants in the future read as `0m ago`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes().max(0);
    let hours = mins / 60;
    let days = hours / 24;

    if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "0m ago");
        assert_eq!(relative_time(now - Duration::seconds(59), now), "0m ago");
        assert_eq!(relative_time(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(relative_time(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(relative_time(now - Duration::hours(23), now), "23h ago");
        assert_eq!(relative_time(now - Duration::hours(49), now), "2d ago");
    }

    #[test]
    fn future_clamps_to_zero() {
        let now = Utc::now();
        assert_eq!(relative_time(now + Duration::hours(3), now), "0m ago");
    }
}
