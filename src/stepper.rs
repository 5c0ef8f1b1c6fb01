use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};

const SHORT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none] [month repr:long]");
const LONG_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short], [hour]:[minute]");

/// Granularity of a single step through the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    /// Anything the config file names that we do not know how to step.
    #[serde(other)]
    Unsupported,
}

/// Which projection of a step result a range displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelFormat {
    Short,
    Long,
    Time,
}

impl LabelFormat {
    /// Numeric width used by the catalog (`1` short, `2` long, `3` time).
    pub fn format_count(self) -> u8 {
        match self {
            LabelFormat::Short => 1,
            LabelFormat::Long => 2,
            LabelFormat::Time => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLabels {
    pub short: String,
    pub long: String,
    pub time: String,
}

impl StepLabels {
    pub fn pick(&self, format: LabelFormat) -> &str {
        match format {
            LabelFormat::Short => &self.short,
            LabelFormat::Long => &self.long,
            LabelFormat::Time => &self.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub labels: StepLabels,
}

impl Step {
    pub fn label(&self, format: LabelFormat) -> &str {
        self.labels.pick(format)
    }
}

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Moves `anchor` by `delta` units and renders every label projection of the result.
///
/// Calendar arithmetic happens in `offset`. A missing anchor means "now". Steps that
/// would leave the representable range, and [`TimeUnit::Unsupported`], leave the
/// anchor where it is.
pub fn step(anchor: Option<OffsetDateTime>, delta: i64, unit: TimeUnit, offset: UtcOffset) -> Step {
    let anchor = anchor.unwrap_or_else(OffsetDateTime::now_utc).to_offset(offset);
    let moved = shift(anchor, delta, unit).unwrap_or(anchor);
    Step {
        timestamp: to_epoch_millis(moved),
        labels: render_labels(moved),
    }
}

/// Same as [`step`] but anchored on an epoch-millisecond timestamp.
pub fn step_from_millis(anchor: i64, delta: i64, unit: TimeUnit, offset: UtcOffset) -> Step {
    match from_epoch_millis(anchor) {
        Some(anchor) => step(Some(anchor), delta, unit, offset),
        None => {
            tracing::warn!(anchor, "timestamp out of range, stepping from now");
            step(None, delta, unit, offset)
        }
    }
}

fn shift(anchor: OffsetDateTime, delta: i64, unit: TimeUnit) -> Option<OffsetDateTime> {
    match unit {
        TimeUnit::Minutes => anchor.checked_add(Duration::minutes(delta)),
        TimeUnit::Hours => anchor.checked_add(Duration::hours(delta)),
        TimeUnit::Days => shift_days(anchor, delta),
        TimeUnit::Weeks => shift_days(anchor, delta.checked_mul(7)?),
        TimeUnit::Months => shift_months(anchor, delta),
        TimeUnit::Unsupported => Some(anchor),
    }
}

fn shift_days(anchor: OffsetDateTime, days: i64) -> Option<OffsetDateTime> {
    let date = anchor.date().checked_add(Duration::days(days))?;
    Some(anchor.replace_date(date))
}

// Keeps the day of month and lets it roll over into the next month, so 31 Jan
// plus one month lands on 2 or 3 Mar.
fn shift_months(anchor: OffsetDateTime, months: i64) -> Option<OffsetDateTime> {
    let date = anchor.date();
    let index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1 + months;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let target = first.checked_add(Duration::days(i64::from(date.day()) - 1))?;
    Some(anchor.replace_date(target))
}

fn render_labels(at: OffsetDateTime) -> StepLabels {
    let fallback = || to_epoch_millis(at).to_string();
    StepLabels {
        short: at.format(SHORT_FORMAT).unwrap_or_else(|_| fallback()),
        long: at.format(LONG_FORMAT).unwrap_or_else(|_| fallback()),
        time: at.format(TIME_FORMAT).unwrap_or_else(|_| fallback()),
    }
}

pub fn to_epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_epoch_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    const KYIV: UtcOffset = offset!(+2);

    #[test]
    fn zero_delta_returns_anchor() {
        let anchor = datetime!(2026-10-17 14:05 +2);
        let result = step(Some(anchor), 0, TimeUnit::Days, KYIV);
        assert_eq!(result.timestamp, to_epoch_millis(anchor));
    }

    #[test]
    fn renders_all_three_label_projections() {
        let anchor = datetime!(2026-10-07 09:05 +2);
        let result = step(Some(anchor), 0, TimeUnit::Minutes, KYIV);
        assert_eq!(result.labels.short, "7 October");
        assert_eq!(result.labels.long, "7 Oct 2026");
        assert_eq!(result.labels.time, "7 Oct, 09:05");
        assert_eq!(result.label(LabelFormat::Long), "7 Oct 2026");
    }

    #[test]
    fn labels_follow_the_configured_offset() {
        let anchor = datetime!(2026-10-17 23:30 UTC);
        let result = step(Some(anchor), 0, TimeUnit::Hours, KYIV);
        assert_eq!(result.labels.time, "18 Oct, 01:30");
    }

    #[test]
    fn inverse_deltas_round_trip() {
        let anchor = datetime!(2026-03-29 01:15 +2);
        for unit in [TimeUnit::Minutes, TimeUnit::Hours, TimeUnit::Days, TimeUnit::Weeks] {
            for delta in [-400, -7, -1, 1, 6, 365] {
                let forward = step(Some(anchor), delta, unit, KYIV);
                let back = step_from_millis(forward.timestamp, -delta, unit, KYIV);
                assert_eq!(
                    back.timestamp,
                    to_epoch_millis(anchor),
                    "{unit:?} by {delta} did not round trip"
                );
            }
        }
    }

    #[test]
    fn weeks_are_seven_days() {
        let anchor = datetime!(2026-10-17 12:00 +2);
        let weeks = step(Some(anchor), 3, TimeUnit::Weeks, KYIV);
        let days = step(Some(anchor), 21, TimeUnit::Days, KYIV);
        assert_eq!(weeks.timestamp, days.timestamp);
    }

    #[test]
    fn month_overflow_rolls_into_next_month() {
        let anchor = datetime!(2026-01-31 08:00 +2);
        let result = step(Some(anchor), 1, TimeUnit::Months, KYIV);
        assert_eq!(result.labels.long, "3 Mar 2026");

        let leap = datetime!(2028-01-31 08:00 +2);
        let result = step(Some(leap), 1, TimeUnit::Months, KYIV);
        assert_eq!(result.labels.long, "2 Mar 2028");
    }

    #[test]
    fn months_cross_year_boundaries_in_both_directions() {
        let anchor = datetime!(2026-11-15 08:00 +2);
        assert_eq!(
            step(Some(anchor), 2, TimeUnit::Months, KYIV).labels.long,
            "15 Jan 2027"
        );
        assert_eq!(
            step(Some(anchor), -12, TimeUnit::Months, KYIV).labels.long,
            "15 Nov 2025"
        );
    }

    #[test]
    fn unsupported_unit_is_a_no_op() {
        let anchor = datetime!(2026-10-17 14:05 +2);
        let result = step(Some(anchor), 42, TimeUnit::Unsupported, KYIV);
        assert_eq!(result.timestamp, to_epoch_millis(anchor));
    }

    #[test]
    fn unknown_unit_names_deserialize_as_unsupported() {
        #[derive(Deserialize)]
        struct Wrapper {
            unit: TimeUnit,
        }
        let parsed: Wrapper = toml::from_str("unit = \"fortnights\"").expect("parse");
        assert_eq!(parsed.unit, TimeUnit::Unsupported);
    }

    #[test]
    fn fixed_clock_reports_its_instant() {
        let at = datetime!(2026-10-17 00:00 UTC);
        assert_eq!(FixedClock(at).now(), at);
    }
}
