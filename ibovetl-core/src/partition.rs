//! Partition path convention: `{prefix}/{yyyy}/{mm}/{dd}/{filename}`.
//!
//! The same convention is used twice: the landing writer builds keys with it,
//! and the dispatcher/transform stage parse keys against it to decide what is
//! a partitioned dataset and what is an out-of-convention upload.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("object key '{key}' does not follow the {{prefix}}/{{yyyy}}/{{mm}}/{{dd}}/{{file}} convention")]
    Malformed { key: String },
}

/// Year/month/day segments recovered from a partitioned object key.
///
/// The raw segments are kept so URIs rebuilt from a parsed key reproduce the
/// original spelling exactly; `date()` exposes the validated calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDate {
    pub year: String,
    pub month: String,
    pub day: String,
    date: NaiveDate,
}

impl PartitionDate {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Storage key for a landed file: `{prefix}/{yyyy}/{mm}/{dd}/{filename}`,
/// zero-padded.
pub fn landed_key(prefix: &str, day: NaiveDate, filename: &str) -> String {
    format!(
        "{prefix}/{:04}/{:02}/{:02}/{filename}",
        day.year(),
        day.month(),
        day.day()
    )
}

/// Parse a key against the partition convention.
///
/// Requires at least 4 `/`-separated segments whose segments 1–3 are numeric
/// and form a valid calendar date. Anything else is `PathError::Malformed`;
/// arbitrary strings never silently mis-parse.
pub fn parse_key(key: &str) -> Result<PartitionDate, PathError> {
    let malformed = || PathError::Malformed {
        key: key.to_string(),
    };

    let segments: Vec<&str> = key.split('/').collect();
    if segments.len() < 4 {
        return Err(malformed());
    }

    let year: i32 = segments[1].parse().map_err(|_| malformed())?;
    let month: u32 = segments[2].parse().map_err(|_| malformed())?;
    let day: u32 = segments[3].parse().map_err(|_| malformed())?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)?;

    Ok(PartitionDate {
        year: segments[1].to_string(),
        month: segments[2].to_string(),
        day: segments[3].to_string(),
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn landed_key_is_zero_padded() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(
            landed_key("upload", day, "b3_data_2024-06-03.parquet"),
            "upload/2024/06/03/b3_data_2024-06-03.parquet"
        );
    }

    #[test]
    fn parse_recovers_the_segments() {
        let parsed = parse_key("upload/2024/06/03/b3_data_2024-06-03.parquet").unwrap();
        assert_eq!(parsed.year, "2024");
        assert_eq!(parsed.month, "06");
        assert_eq!(parsed.day, "03");
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[test]
    fn too_few_segments_is_malformed() {
        assert!(matches!(
            parse_key("bad/file.parquet"),
            Err(PathError::Malformed { .. })
        ));
        assert!(matches!(parse_key(""), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn non_numeric_segments_are_malformed() {
        assert!(parse_key("upload/year/month/day/file.parquet").is_err());
    }

    #[test]
    fn impossible_dates_are_malformed() {
        assert!(parse_key("upload/2024/13/01/file.parquet").is_err());
        assert!(parse_key("upload/2023/02/29/file.parquet").is_err());
    }

    proptest! {
        #[test]
        fn build_then_parse_roundtrips(
            days in 0i64..40_000,
            prefix in "[a-z]{1,8}",
            name in "[a-z0-9_-]{1,16}\\.parquet",
        ) {
            let day = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
                + chrono::Duration::days(days);
            let key = landed_key(&prefix, day, &name);
            let parsed = parse_key(&key).unwrap();
            prop_assert_eq!(parsed.date(), day);
        }
    }
}
