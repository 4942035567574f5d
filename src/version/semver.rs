use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::version::types::{SortOrder, VersionInfo};

/// Release stage of a numbered version
///
/// A pre-release of some numbers ranks above the final release of the same
/// numbers, so "2.0rc1" is newer than "2.0". Only the marker's rank is kept,
/// so spellings of one marker ("a1", "alpha1") are the same version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Final,
    Pre { rank: u8, number: u64 },
}

/// Normalized, totally ordered representation of a version
///
/// Channel tokens (e.g. rust's "stable") rank above every numbered release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionKey {
    Release { version: Version, stage: Stage },
    Channel(String),
}

impl VersionKey {
    pub fn release(major: u64, minor: u64, patch: u64) -> Self {
        VersionKey::Release {
            version: Version::new(major, minor, patch),
            stage: Stage::Final,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        matches!(
            self,
            VersionKey::Release {
                stage: Stage::Pre { .. },
                ..
            }
        )
    }

    /// Major version number, `None` for channel tokens
    pub fn major(&self) -> Option<u64> {
        match self {
            VersionKey::Release { version, .. } => Some(version.major),
            VersionKey::Channel(_) => None,
        }
    }
}

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:[-._]?([A-Za-z]+)(?:[-._]?(\d+))?)?$")
        .expect("version pattern is valid")
});

/// Rank of a pre-release label, `None` when the label is not a known marker
fn prerelease_rank(label: &str) -> Option<u8> {
    match label {
        "dev" | "nightly" | "next" | "test" | "experimental" | "snapshot" => Some(0),
        "a" | "alpha" => Some(1),
        "b" | "beta" => Some(2),
        "pre" | "preview" => Some(3),
        "rc" => Some(4),
        _ => None,
    }
}

/// Parse a version string into a normalized key.
///
/// Handles partial versions by padding with zeros and recognises pre-release
/// suffixes with or without a separator. Does NOT strip ecosystem prefixes
/// like "v" or "go".
///
/// Examples:
/// - "1.22" -> 1.22.0 (final)
/// - "3.13.0rc1" -> 3.13.0 (rc 1)
/// - "22.0.0-rc.1" -> 22.0.0 (rc 1)
/// - "3.4.0-preview2" -> 3.4.0 (preview 2)
pub fn parse_version(version: &str) -> Option<VersionKey> {
    let captures = VERSION_PATTERN.captures(version.trim())?;

    let number = |index: usize| -> Option<u64> {
        match captures.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let release = Version::new(number(1)?, number(2)?, number(3)?);

    let stage = match captures.get(4) {
        None => Stage::Final,
        Some(label) => {
            let rank = prerelease_rank(&label.as_str().to_ascii_lowercase())?;
            Stage::Pre {
                rank,
                number: number(5)?,
            }
        }
    };

    Some(VersionKey::Release {
        version: release,
        stage,
    })
}

/// Deduplicate by normalized key, order, and keep the greatest `limit` versions.
///
/// The first occurrence of a key wins. Truncation always keeps the greatest
/// versions regardless of `order`; `limit` 0 keeps everything.
pub fn order_versions(versions: Vec<VersionInfo>, order: SortOrder, limit: usize) -> Vec<VersionInfo> {
    let mut seen = HashSet::new();
    let mut unique: Vec<VersionInfo> = versions
        .into_iter()
        .filter(|v| seen.insert(v.key().clone()))
        .collect();

    unique.sort_by(|a, b| b.key().cmp(a.key()));

    if limit > 0 {
        unique.truncate(limit);
    }

    if order == SortOrder::Ascending {
        unique.reverse();
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::types::Stability;
    use rstest::rstest;

    fn pre(major: u64, minor: u64, patch: u64, rank: u8, number: u64) -> VersionKey {
        VersionKey::Release {
            version: Version::new(major, minor, patch),
            stage: Stage::Pre { rank, number },
        }
    }

    #[rstest]
    #[case("1", Some(VersionKey::release(1, 0, 0)))]
    #[case("1.22", Some(VersionKey::release(1, 22, 0)))]
    #[case("1.22.1", Some(VersionKey::release(1, 22, 1)))]
    #[case("3.13.0rc1", Some(pre(3, 13, 0, 4, 1)))]
    #[case("3.13.0a10", Some(pre(3, 13, 0, 1, 10)))]
    #[case("22.0.0-rc.1", Some(pre(22, 0, 0, 4, 1)))]
    #[case("3.4.0-preview2", Some(pre(3, 4, 0, 3, 2)))]
    #[case("1.23rc1", Some(pre(1, 23, 0, 4, 1)))]
    #[case("18.20.0-nightly", Some(pre(18, 20, 0, 0, 0)))]
    #[case("1.2.3.4", None)]
    #[case("1.2.3foo", None)]
    #[case("weekly.2011-11-02", None)]
    #[case("", None)]
    fn parse_version_returns_expected(#[case] input: &str, #[case] expected: Option<VersionKey>) {
        assert_eq!(parse_version(input), expected);
    }

    #[test]
    fn prerelease_ranks_above_final_of_same_numbers() {
        let final_release = parse_version("2.0").unwrap();
        let candidate = parse_version("2.0rc1").unwrap();
        let next_minor = parse_version("2.1").unwrap();

        assert!(candidate > final_release);
        assert!(next_minor > candidate);
    }

    #[rstest]
    #[case("3.13.0a1", "3.13.0alpha1")]
    #[case("3.13.0b2", "3.13.0-beta.2")]
    #[case("3.4.0-pre1", "3.4.0-preview1")]
    #[case("22.0.0-RC.1", "22.0.0rc1")]
    fn marker_spellings_share_a_key(#[case] a: &str, #[case] b: &str) {
        assert_eq!(parse_version(a), parse_version(b));
    }

    #[test]
    fn order_versions_dedupes_marker_spellings() {
        let ordered = order_versions(
            vec![info("3.13.0a1"), info("3.13.0alpha1"), info("3.13.0b1")],
            SortOrder::Descending,
            0,
        );

        assert_eq!(names(&ordered), vec!["3.13.0b1", "3.13.0a1"]);
    }

    #[rstest]
    #[case("3.13.0a9", "3.13.0a10")]
    #[case("3.13.0a2", "3.13.0b1")]
    #[case("3.13.0b4", "3.13.0rc1")]
    #[case("3.4.0-preview3", "3.4.0-rc1")]
    #[case("1.9", "1.10")]
    fn ordering_follows_release_sequence(#[case] older: &str, #[case] newer: &str) {
        assert!(parse_version(older).unwrap() < parse_version(newer).unwrap());
    }

    #[test]
    fn channel_ranks_above_releases() {
        let channel = VersionKey::Channel("stable".to_string());
        assert!(channel > parse_version("999.0.0rc1").unwrap());
        assert!(!channel.is_prerelease());
    }

    fn info(version: &str) -> VersionInfo {
        let key = parse_version(version).unwrap();
        let stability = if key.is_prerelease() {
            Stability::Prerelease
        } else {
            Stability::Stable
        };
        VersionInfo::new(version, version, key, stability)
    }

    fn names(versions: &[VersionInfo]) -> Vec<&str> {
        versions.iter().map(|v| v.version()).collect()
    }

    #[test]
    fn order_versions_dedupes_sorts_and_keeps_greatest() {
        let versions = vec![info("1.20"), info("1.22.0"), info("1.20.0"), info("1.21.3")];

        let ordered = order_versions(versions.clone(), SortOrder::Descending, 2);
        assert_eq!(names(&ordered), vec!["1.22.0", "1.21.3"]);

        let ordered = order_versions(versions, SortOrder::Ascending, 2);
        assert_eq!(names(&ordered), vec!["1.21.3", "1.22.0"]);
    }

    #[test]
    fn order_versions_keeps_first_duplicate() {
        let ordered = order_versions(vec![info("1.20"), info("1.20.0")], SortOrder::Descending, 0);

        assert_eq!(names(&ordered), vec!["1.20"]);
    }

    #[test]
    fn order_versions_is_deterministic_for_shuffled_input() {
        let a = order_versions(
            vec![info("3.1.0"), info("3.0.1"), info("3.2.0rc1"), info("3.2.0")],
            SortOrder::Descending,
            0,
        );
        let b = order_versions(
            vec![info("3.2.0"), info("3.0.1"), info("3.2.0rc1"), info("3.1.0")],
            SortOrder::Descending,
            0,
        );

        assert_eq!(a, b);
        assert_eq!(names(&a), vec!["3.2.0rc1", "3.2.0", "3.1.0", "3.0.1"]);
    }
}
