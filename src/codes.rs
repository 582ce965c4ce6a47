//! The Japanese area code classification table.
//!
//! Japanese area codes are variable length: anywhere from 2 to 6 digits
//! including the leading zero. The digit string of a phone number does not
//! reveal where the code ends, so the canonicalizer needs a table of known
//! codes grouped by length to find the split. The table is built once from
//! a scraped code dump and shared read-only afterwards.
//!
//! Scraped dumps drop the leading zero (the codes are read as numbers), so
//! the builder restores it before bucketing.

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Known area codes partitioned into buckets by digit length, leading zero
/// included.
///
/// A code lives in exactly one bucket; that disjointness is what makes the
/// longest-first waterfall in [`crate::normalize`] unambiguous. Codes that
/// cannot be bucketed are kept in `outliers` for auditing instead of being
/// dropped, and are never consulted during normalization.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTable {
    pub two_digit: HashSet<String>,
    pub three_digit: HashSet<String>,
    pub four_digit: HashSet<String>,
    pub five_digit: HashSet<String>,
    pub six_digit: HashSet<String>,
    pub outliers: Vec<String>,
}

/// A code that sits in a bucket it does not belong to.
///
/// The waterfall trusts the bucket partition, so a misfiled code would make
/// splits unreliable in a way that cannot be recovered per-number. This is
/// only reachable through a corrupted bundle, never through `from_raw_codes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTableError {
    pub expected: usize,
    pub code: String,
}

impl Display for CodeTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "code table is inconsistent: `{}` does not belong in the {}-digit bucket",
            self.code, self.expected
        )
    }
}

impl Error for CodeTableError {}

impl CodeTable {
    /// Builds the table from raw scraped codes whose leading zero was
    /// dropped upstream.
    ///
    /// Duplicates are silently skipped and unbucketable entries go to the
    /// outlier list, so building never fails.
    pub fn from_raw_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for code in codes {
            table.insert_raw(code.as_ref());
        }
        table
    }

    fn insert_raw(&mut self, raw: &str) {
        let raw = raw.trim();
        let mut code = String::with_capacity(raw.len() + 1);
        code.push('0');
        code.push_str(raw);
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            self.outliers.push(code);
            return;
        }
        match code.len() {
            2 => {
                self.two_digit.insert(code);
            }
            3 => {
                self.three_digit.insert(code);
            }
            4 => {
                self.four_digit.insert(code);
            }
            5 => {
                self.five_digit.insert(code);
            }
            6 => {
                self.six_digit.insert(code);
            }
            _ => self.outliers.push(code),
        }
    }

    fn buckets(&self) -> [(usize, &HashSet<String>); 5] {
        [
            (2, &self.two_digit),
            (3, &self.three_digit),
            (4, &self.four_digit),
            (5, &self.five_digit),
            (6, &self.six_digit),
        ]
    }

    /// Whether `code` (leading zero included) is a registered area code.
    pub fn has_area_code(&self, code: &str) -> bool {
        let bucket = match code.len() {
            2 => &self.two_digit,
            3 => &self.three_digit,
            4 => &self.four_digit,
            5 => &self.five_digit,
            6 => &self.six_digit,
            _ => return false,
        };
        bucket.contains(code)
    }

    /// The number of bucketed codes, outliers excluded.
    pub fn len(&self) -> usize {
        self.buckets().iter().map(|(_, bucket)| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the bucket partition invariant: every bucketed code is a
    /// zero-led digit string of its bucket's length.
    ///
    /// `from_raw_codes` upholds this by construction; this exists to catch
    /// corruption coming in through a deserialized bundle.
    pub fn verify(&self) -> Result<(), CodeTableError> {
        for (length, bucket) in self.buckets() {
            for code in bucket {
                let well_formed = code.len() == length
                    && code.starts_with('0')
                    && code.bytes().all(|b| b.is_ascii_digit());
                if !well_formed {
                    return Err(CodeTableError {
                        expected: length,
                        code: code.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Writes the table as a JSON bundle.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("could not write code table to {}", path.display()))?;
        Ok(())
    }

    /// Loads and re-verifies a JSON bundle written by [`CodeTable::save`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let buffer = crate::load_file(path)
            .with_context(|| format!("could not read code table from {}", path.display()))?;
        let table = buffer.parse::<Self>()?;
        Ok(table)
    }
}

impl FromStr for CodeTable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let table: Self =
            serde_json::from_str(s).with_context(|| "could not parse code table bundle")?;
        table.verify()?;
        Ok(table)
    }
}

/// Extracts the code column from a scraped `area,code` dump.
///
/// One record per line; the area name may itself contain commas so the
/// split is on the last one. Lines without a comma are taken as bare codes
/// and blank lines are skipped. Junk records (headers, footnotes) are not
/// filtered here, the builder routes them to the outlier list.
pub fn parse_code_dump(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let code = match line.rsplit_once(',') {
                Some((_, code)) => code.trim(),
                None => line,
            };
            (!code.is_empty()).then(|| code.to_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucketing_by_restored_length() {
        let table = CodeTable::from_raw_codes(["3", "45", "123", "1234", "12345"]);
        assert!(table.two_digit.contains("03"));
        assert!(table.three_digit.contains("045"));
        assert!(table.four_digit.contains("0123"));
        assert!(table.five_digit.contains("01234"));
        assert!(table.six_digit.contains("012345"));
        assert!(table.outliers.is_empty());
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let table = CodeTable::from_raw_codes(["3", "3"]);
        assert_eq!(table.two_digit.len(), 1);
        assert!(table.two_digit.contains("03"));
    }

    #[test]
    fn test_outliers_are_kept_not_dropped() {
        let table = CodeTable::from_raw_codes(["123456", "NaN", ""]);
        assert!(table.is_empty());
        assert_eq!(table.outliers, vec!["0123456", "0NaN", "0"]);
    }

    #[test]
    fn test_empty_input() {
        let table = CodeTable::from_raw_codes(std::iter::empty::<&str>());
        assert!(table.is_empty());
        assert!(table.outliers.is_empty());
        assert!(table.verify().is_ok());
    }

    #[test]
    fn test_each_code_in_exactly_one_bucket() {
        let table = CodeTable::from_raw_codes(["3", "45", "456", "4567"]);
        for (length, bucket) in table.buckets() {
            for code in bucket {
                assert_eq!(code.len(), length);
                let elsewhere = table
                    .buckets()
                    .iter()
                    .filter(|(other, _)| *other != length)
                    .any(|(_, other)| other.contains(code));
                assert!(!elsewhere, "{code} appears in two buckets");
            }
        }
    }

    #[test]
    fn test_verify_catches_misfiled_code() {
        let mut table = CodeTable::from_raw_codes(["3"]);
        table.three_digit.insert("03".to_owned());
        let err = table.verify().expect_err("misfiled code not caught");
        assert_eq!(err.expected, 3);
        assert_eq!(err.code, "03");
    }

    #[test]
    fn test_bundle_round_trip() {
        let table = CodeTable::from_raw_codes(["3", "45", "123", "99999999"]);
        let bundle = serde_json::to_string(&table).unwrap();
        let restored = bundle.parse::<CodeTable>().unwrap();
        assert_eq!(table, restored);
    }

    #[test]
    fn test_parse_code_dump() {
        let dump = "area,code\nTokyo,3\nYokohama, 45\n\n569\nKamikawa, Hokkaido,16582\n";
        assert_eq!(
            parse_code_dump(dump),
            vec!["code", "3", "45", "569", "16582"]
        );
    }
}
