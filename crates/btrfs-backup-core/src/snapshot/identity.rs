//! Snapshot names.
//!
//! Snapshot directories are named `<timestamp>[-<suffix>]`. Two timestamp
//! shapes are read back: the current second-precision `YYYY-MM-DDTHH:MM:SS`
//! and the legacy day-precision `YYYY-MM-DD`. Only the current shape is ever
//! written.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::error::Error;

/// strftime pattern of names produced by [`snapshot_name`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATE_LEN: usize = 10;
const PRECISE_LEN: usize = 19;

/// Which naming shape a snapshot was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameFormat {
    /// `YYYY-MM-DD[-suffix]`, read as midnight of that day.
    LegacyDateOnly,
    /// `YYYY-MM-DDTHH:MM:SS[-suffix]`.
    PreciseTimestamp,
}

/// A directory entry that does not follow either naming shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a snapshot name")]
pub struct NotASnapshot(pub String);

/// Structural identity of a snapshot, independent of how its directory is
/// spelled. Used to decide whether a snapshot already exists elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub timestamp: NaiveDateTime,
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotIdentity {
    timestamp: NaiveDateTime,
    suffix: Option<String>,
    raw_name: String,
    format: NameFormat,
}

impl SnapshotIdentity {
    /// Identity of a snapshot about to be created. The timestamp is
    /// truncated to whole seconds so the name reads back identically.
    pub fn new(timestamp: NaiveDateTime, suffix: Option<&str>) -> Result<Self, Error> {
        if let Some(suffix) = suffix {
            validate_suffix(suffix)?;
        }
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Ok(Self {
            timestamp,
            suffix: suffix.map(str::to_string),
            raw_name: snapshot_name(timestamp, suffix),
            format: NameFormat::PreciseTimestamp,
        })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn format(&self) -> NameFormat {
        self.format
    }

    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            timestamp: self.timestamp,
            suffix: self.suffix.clone(),
        }
    }

    /// True when both identities describe the same snapshot, whatever the
    /// spelling of their directory names.
    pub fn same_snapshot(&self, other: &SnapshotIdentity) -> bool {
        self.timestamp == other.timestamp && self.suffix == other.suffix
    }
}

/// Chronological order. Equal timestamps fall back to the raw name so the
/// order is total and stable.
impl Ord for SnapshotIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.raw_name.cmp(&other.raw_name))
    }
}

impl PartialOrd for SnapshotIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SnapshotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_name)
    }
}

impl FromStr for SnapshotIdentity {
    type Err = NotASnapshot;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        parse(name)
    }
}

/// Classify a directory name. Never fails for any reason other than the
/// name not being a snapshot name.
pub fn parse(name: &str) -> Result<SnapshotIdentity, NotASnapshot> {
    let reject = || NotASnapshot(name.to_string());
    let bytes = name.as_bytes();

    let date = bytes
        .get(..DATE_LEN)
        .and_then(parse_date)
        .ok_or_else(reject)?;

    let (timestamp, format, rest) = if bytes.get(DATE_LEN) == Some(&b'T') {
        let time = bytes
            .get(DATE_LEN + 1..PRECISE_LEN)
            .and_then(parse_time)
            .ok_or_else(reject)?;
        (
            date.and_time(time),
            NameFormat::PreciseTimestamp,
            &name[PRECISE_LEN..],
        )
    } else {
        (
            date.and_hms_opt(0, 0, 0).ok_or_else(reject)?,
            NameFormat::LegacyDateOnly,
            &name[DATE_LEN..],
        )
    };

    let suffix = if rest.is_empty() {
        None
    } else {
        let suffix = rest
            .strip_prefix('-')
            .filter(|s| !s.is_empty())
            .ok_or_else(reject)?;
        Some(suffix.to_string())
    };

    Ok(SnapshotIdentity {
        timestamp,
        suffix,
        raw_name: name.to_string(),
        format,
    })
}

/// Directory name for a new snapshot.
pub fn snapshot_name(timestamp: NaiveDateTime, suffix: Option<&str>) -> String {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    match suffix {
        Some(suffix) => format!("{}-{}", stamp, suffix),
        None => stamp.to_string(),
    }
}

/// Suffixes end up in a directory name, so they must be a single non-empty
/// path component.
pub fn validate_suffix(suffix: &str) -> Result<(), Error> {
    if suffix.is_empty() || suffix.contains('/') || suffix.contains('\0') {
        return Err(Error::InvalidSuffix(suffix.to_string()));
    }
    Ok(())
}

fn parse_date(b: &[u8]) -> Option<NaiveDate> {
    if b.len() != DATE_LEN || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let year = digits(&b[0..4])?;
    let month = digits(&b[5..7])?;
    let day = digits(&b[8..10])?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_time(b: &[u8]) -> Option<NaiveTime> {
    if b.len() != 8 || b[2] != b':' || b[5] != b':' {
        return None;
    }
    let hour = digits(&b[0..2])?;
    let minute = digits(&b[3..5])?;
    let second = digits(&b[6..8])?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn digits(b: &[u8]) -> Option<u32> {
    if !b.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(b.iter().fold(0, |n, d| n * 10 + u32::from(d - b'0')))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_precise() {
        let snap = parse("2025-08-16T14:30:00").unwrap();
        assert_eq!(snap.timestamp(), at(2025, 8, 16, 14, 30, 0));
        assert_eq!(snap.suffix(), None);
        assert_eq!(snap.format(), NameFormat::PreciseTimestamp);
        assert_eq!(snap.raw_name(), "2025-08-16T14:30:00");
    }

    #[test]
    fn test_parse_precise_with_suffix() {
        let snap = parse("2025-08-16T14:30:00-weekly-backup").unwrap();
        assert_eq!(snap.timestamp(), at(2025, 8, 16, 14, 30, 0));
        assert_eq!(snap.suffix(), Some("weekly-backup"));
    }

    #[test]
    fn test_parse_legacy_is_midnight() {
        let snap = parse("2025-01-02-old").unwrap();
        assert_eq!(snap.timestamp(), at(2025, 1, 2, 0, 0, 0));
        assert_eq!(snap.suffix(), Some("old"));
        assert_eq!(snap.format(), NameFormat::LegacyDateOnly);

        let bare = parse("2025-01-02").unwrap();
        assert_eq!(bare.suffix(), None);
    }

    #[test]
    fn test_rejects_malformed_names() {
        for name in [
            "",
            "lost+found",
            ".snapshots",
            "2025-13-01",
            "2025-02-30",
            "2025-1-01",
            "2025-01-01-",
            "2025-01-01T",
            "2025-01-01T10:00",
            "2025-01-01T25:00:00",
            "2025-01-01T10:00:00-",
            "2025-01-01T10:00:00x",
            "2025-01-01_backup",
            "2025-01-01Tfoo",
        ] {
            assert_eq!(parse(name), Err(NotASnapshot(name.to_string())), "{name}");
        }
    }

    #[test]
    fn test_name_round_trip() {
        for name in [
            "2025-01-01T00:00:00",
            "2025-08-16T14:30:00-test-snapshot",
            "1999-12-31T23:59:59-a b c",
        ] {
            let parsed = parse(name).unwrap();
            let rebuilt = snapshot_name(parsed.timestamp(), parsed.suffix());
            assert_eq!(rebuilt, name);
            let reparsed = parse(&rebuilt).unwrap();
            assert_eq!(reparsed.cmp(&parsed), Ordering::Equal);
        }
    }

    #[test]
    fn test_legacy_name_rewritten_in_precise_form() {
        let legacy = parse("2025-01-02-old").unwrap();
        let rebuilt = parse(&snapshot_name(legacy.timestamp(), legacy.suffix())).unwrap();
        assert_eq!(rebuilt.raw_name(), "2025-01-02T00:00:00-old");
        assert!(rebuilt.same_snapshot(&legacy));
    }

    #[test]
    fn test_new_truncates_subseconds() {
        let ts = at(2025, 8, 16, 14, 30, 0).with_nanosecond(123_456_789).unwrap();
        let snap = SnapshotIdentity::new(ts, Some("nightly")).unwrap();
        assert_eq!(snap.raw_name(), "2025-08-16T14:30:00-nightly");
        assert_eq!(snap.timestamp(), at(2025, 8, 16, 14, 30, 0));
        assert_eq!(parse(snap.raw_name()).unwrap(), snap);
    }

    #[test]
    fn test_new_rejects_bad_suffix() {
        let ts = at(2025, 8, 16, 14, 30, 0);
        assert!(matches!(
            SnapshotIdentity::new(ts, Some("a/b")),
            Err(Error::InvalidSuffix(_))
        ));
        assert!(matches!(
            SnapshotIdentity::new(ts, Some("")),
            Err(Error::InvalidSuffix(_))
        ));
    }

    #[test]
    fn test_ordering_ties_break_on_raw_name() {
        let legacy_a = parse("2025-01-01-a").unwrap();
        let legacy_b = parse("2025-01-01-b").unwrap();
        let precise = parse("2025-01-01T00:00:01").unwrap();
        assert!(legacy_a < legacy_b);
        assert!(legacy_b < precise);

        let same_a = parse("2025-01-01T10:00:00-alpha").unwrap();
        let same_b = parse("2025-01-01T10:00:00-beta").unwrap();
        assert!(same_a < same_b);
        assert!(!same_a.same_snapshot(&same_b));
    }

    #[test]
    fn test_from_str() {
        let snap: SnapshotIdentity = "2025-01-15T00:00:00".parse().unwrap();
        assert_eq!(snap.to_string(), "2025-01-15T00:00:00");
        assert!("nope".parse::<SnapshotIdentity>().is_err());
    }
}
