use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Renders a span the way stage progress shows it: "2 days 3 hours",
/// "45 minutes", "30 seconds". Only the two most significant units are kept.
pub fn humanize_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let parts: Vec<String> = [
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
        (seconds, "second"),
    ]
    .into_iter()
    .skip_while(|(value, _)| *value == 0)
    .take(2)
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| {
        if value == 1 {
            format!("{} {}", value, unit)
        } else {
            format!("{} {}s", value, unit)
        }
    })
    .collect();

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_keeps_two_most_significant_units() {
        let d = Duration::days(2) + Duration::hours(3) + Duration::minutes(15);
        assert_eq!(humanize_duration(d), "2 days 3 hours");
    }

    #[test]
    fn humanize_skips_zero_units() {
        assert_eq!(humanize_duration(Duration::minutes(45)), "45 minutes");
        assert_eq!(humanize_duration(Duration::hours(1) + Duration::seconds(5)), "1 hour");
        assert_eq!(humanize_duration(Duration::zero()), "0 seconds");
        assert_eq!(humanize_duration(Duration::seconds(-5)), "0 seconds");
    }
}
