use std::fmt;

use chrono::{DateTime, Duration, Utc};
use url::Url;

/// Whole time units left until a release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    /// Time remaining from `now` until `target`, all zero once `target` is reached.
    ///
    /// Partial seconds round up, so the countdown only reads zero at `target`.
    #[must_use]
    pub fn between(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let remaining = target - now;
        if remaining <= Duration::zero() {
            return Self::default();
        }
        let total = remaining.num_seconds() + i64::from(remaining.subsec_nanos() > 0);
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Calendar entry a learner can add for an upcoming lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarReminder {
    pub title: String,
    pub details: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
}

impl CalendarReminder {
    pub fn new(title: impl Into<String>, details: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            details: details.into(),
            location: "Online".to_owned(),
            start,
            duration: Duration::hours(2),
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration
    }

    /// Google Calendar "add event" link.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the calendar endpoint cannot be parsed.
    pub fn google_calendar_url(&self) -> Result<Url, url::ParseError> {
        const STAMP: &str = "%Y%m%dT%H%M%SZ";
        let dates = format!(
            "{}/{}",
            self.start.format(STAMP),
            self.end().format(STAMP)
        );
        let mut url = Url::parse("https://www.google.com/calendar/render")?;
        url.query_pairs_mut()
            .append_pair("action", "TEMPLATE")
            .append_pair("text", &self.title)
            .append_pair("dates", &dates)
            .append_pair("details", &self.details)
            .append_pair("location", &self.location);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn splits_remaining_time() {
        let target = fixed_now()
            + Duration::days(2)
            + Duration::hours(3)
            + Duration::minutes(4)
            + Duration::seconds(5);
        let c = Countdown::between(fixed_now(), target);
        assert_eq!(
            c,
            Countdown {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert_eq!(c.to_string(), "02d 03h 04m 05s");
    }

    #[test]
    fn finished_at_and_after_target() {
        assert!(Countdown::between(fixed_now(), fixed_now()).is_finished());
        assert!(Countdown::between(fixed_now() + Duration::hours(1), fixed_now()).is_finished());
    }

    #[test]
    fn sub_second_remainder_rounds_up() {
        let c = Countdown::between(fixed_now(), fixed_now() + Duration::milliseconds(1_500));
        assert_eq!(c.total_seconds(), 2);

        let last = Countdown::between(fixed_now(), fixed_now() + Duration::milliseconds(500));
        assert!(!last.is_finished());
        assert_eq!(last.seconds, 1);
    }

    #[test]
    fn calendar_link_spans_two_hours() {
        let reminder = CalendarReminder::new("Aula Inaugural", "Aula 1: Fundamentos", fixed_now());
        let url = reminder.google_calendar_url().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("action".into(), "TEMPLATE".into())));
        assert!(pairs.contains(&("dates".into(), "20251201T230000Z/20251202T010000Z".into())));
        assert!(pairs.contains(&("text".into(), "Aula Inaugural".into())));
        assert!(pairs.contains(&("location".into(), "Online".into())));
    }
}
