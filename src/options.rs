use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

use crate::stepper::{LabelFormat, TimeUnit};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown range option `{0}` (try `timescroll options`)")]
    UnknownRange(String),
    #[error("unknown size option `{0}` (try `timescroll options`)")]
    UnknownSize(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RangeKey {
    Minutes7,
    Hour,
    Hours6,
    Day,
    Days3,
    Week,
    Weeks3,
    Month,
    Months2,
    Months6,
}

impl Default for RangeKey {
    fn default() -> Self {
        RangeKey::Day
    }
}

impl RangeKey {
    pub fn parse(raw: &str) -> Result<Self, OptionError> {
        Self::from_str(raw.trim()).map_err(|_| OptionError::UnknownRange(raw.to_string()))
    }

    pub fn option(self) -> &'static RangeOption {
        &RANGES[&self]
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SizeKey {
    Size3x6,
    Size3x3,
    Size0x6,
}

impl Default for SizeKey {
    fn default() -> Self {
        SizeKey::Size3x6
    }
}

impl SizeKey {
    pub fn parse(raw: &str) -> Result<Self, OptionError> {
        Self::from_str(raw.trim()).map_err(|_| OptionError::UnknownSize(raw.to_string()))
    }

    pub fn option(self) -> &'static SizeOption {
        &SIZES[&self]
    }
}

/// Granularity, stride and label projection of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOption {
    pub key: RangeKey,
    pub unit: TimeUnit,
    pub step: i64,
    pub format: LabelFormat,
    pub title: &'static str,
}

/// How many items stay materialised on either side of the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeOption {
    pub key: SizeKey,
    pub before_count: usize,
    pub after_count: usize,
    pub title: &'static str,
}

static RANGES: Lazy<IndexMap<RangeKey, RangeOption>> = Lazy::new(|| {
    use LabelFormat::{Long, Short, Time};
    use TimeUnit::{Days, Hours, Minutes, Months, Weeks};
    [
        (RangeKey::Minutes7, Minutes, 7, Time, "7 Minutes"),
        (RangeKey::Hour, Hours, 1, Time, "1 Hour"),
        (RangeKey::Hours6, Hours, 6, Time, "6 Hours"),
        (RangeKey::Day, Days, 1, Short, "1 Day"),
        (RangeKey::Days3, Days, 3, Short, "3 Days"),
        (RangeKey::Week, Weeks, 1, Long, "1 Week"),
        (RangeKey::Weeks3, Weeks, 3, Long, "3 Weeks"),
        (RangeKey::Month, Months, 1, Long, "1 Month"),
        (RangeKey::Months2, Months, 2, Long, "2 Months"),
        (RangeKey::Months6, Months, 6, Long, "6 Months"),
    ]
    .into_iter()
    .map(|(key, unit, step, format, title)| {
        (
            key,
            RangeOption {
                key,
                unit,
                step,
                format,
                title,
            },
        )
    })
    .collect()
});

static SIZES: Lazy<IndexMap<SizeKey, SizeOption>> = Lazy::new(|| {
    [
        (SizeKey::Size3x6, 3, 6, "Before 3, After 6"),
        (SizeKey::Size3x3, 3, 3, "Before 3, After 3"),
        (SizeKey::Size0x6, 0, 6, "Before 0, After 6"),
    ]
    .into_iter()
    .map(|(key, before_count, after_count, title)| {
        (
            key,
            SizeOption {
                key,
                before_count,
                after_count,
                title,
            },
        )
    })
    .collect()
});

/// Range options in display order.
pub fn ranges() -> impl Iterator<Item = &'static RangeOption> {
    RANGES.values()
}

/// Size options in display order.
pub fn sizes() -> impl Iterator<Item = &'static SizeOption> {
    SIZES.values()
}

pub fn range_keys() -> impl Iterator<Item = RangeKey> {
    RangeKey::iter()
}

pub fn size_keys() -> impl Iterator<Item = SizeKey> {
    SizeKey::iter()
}

/// The active range and size. The two axes change independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Configuration {
    range: RangeKey,
    size: SizeKey,
}

impl Configuration {
    pub fn new(range: RangeKey, size: SizeKey) -> Self {
        Self { range, size }
    }

    pub fn range(&self) -> &'static RangeOption {
        self.range.option()
    }

    pub fn size(&self) -> &'static SizeOption {
        self.size.option()
    }

    pub fn range_key(&self) -> RangeKey {
        self.range
    }

    pub fn size_key(&self) -> SizeKey {
        self.size
    }

    /// Returns `true` when the range actually changed.
    pub fn set_range(&mut self, key: RangeKey) -> bool {
        let changed = self.range != key;
        self.range = key;
        changed
    }

    /// Returns `true` when the size actually changed.
    pub fn set_size(&mut self, key: SizeKey) -> bool {
        let changed = self.size != key;
        self.size = key;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn catalog_preserves_display_order() {
        let keys: Vec<_> = ranges().map(|range| range.key.to_string()).collect();
        assert_eq!(
            keys,
            [
                "minutes7", "hour", "hours6", "day", "days3", "week", "weeks3", "month",
                "months2", "months6"
            ]
        );
        let sizes: Vec<_> = sizes().map(|size| size.key.as_ref().to_string()).collect();
        assert_eq!(sizes, ["size3x6", "size3x3", "size0x6"]);
    }

    #[test]
    fn every_key_has_a_catalog_entry() {
        for key in range_keys() {
            assert_eq!(key.option().key, key);
        }
        for key in size_keys() {
            assert_eq!(key.option().key, key);
        }
    }

    #[test]
    fn format_widths_match_granularity() {
        assert_eq!(RangeKey::Minutes7.option().format.format_count(), 3);
        assert_eq!(RangeKey::Days3.option().format.format_count(), 1);
        assert_eq!(RangeKey::Months6.option().format.format_count(), 2);
        assert_eq!(RangeKey::Weeks3.option().unit, TimeUnit::Weeks);
        assert_eq!(RangeKey::Weeks3.option().step, 3);
    }

    #[test]
    fn parses_keys_and_reports_unknown_ones() {
        assert_eq!(RangeKey::parse("hours6"), Ok(RangeKey::Hours6));
        assert_eq!(SizeKey::parse(" size0x6 "), Ok(SizeKey::Size0x6));
        assert_matches!(RangeKey::parse("decade"), Err(OptionError::UnknownRange(raw)) if raw == "decade");
        assert_matches!(SizeKey::parse("huge"), Err(OptionError::UnknownSize(_)));
    }

    #[test]
    fn range_and_size_change_independently() {
        let mut config = Configuration::default();
        assert_eq!(config.range_key(), RangeKey::Day);
        assert_eq!(config.size_key(), SizeKey::Size3x6);

        assert!(config.set_size(SizeKey::Size0x6));
        assert!(config.set_range(RangeKey::Week));
        assert_eq!(config.size().before_count, 0);
        assert_eq!(config.range().unit, TimeUnit::Weeks);
        assert!(!config.set_range(RangeKey::Week));
    }
}
