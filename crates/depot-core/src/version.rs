//! Version parsing, ordering, and range matching.
//!
//! Versions follow the `major[.minor[.micro[.qualifier]]]` form:
//! - the three numeric fields compare numerically, missing ones are `0`
//! - the qualifier is the final tiebreak and compares lexicographically,
//!   so a version without a qualifier sorts before any qualified one
//! - the `latest` sentinel sorts above every concrete version
//!
//! Ranges are `[floor,ceiling]` intervals whose ends are inclusive (`[`, `]`)
//! or exclusive (`(`, `)`). A bare version `v` means `[v,∞)`.

use std::fmt;
use std::str::FromStr;

use depot_util::errors::DepotError;

/// Literal that selects the greatest available version instead of a range.
pub const LATEST: &str = "latest";

/// A parsed `major.minor.micro.qualifier` version.
///
/// Field order matters: the derived ordering compares the sentinel flag
/// first, then the numeric fields, then the qualifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    latest: bool,
    major: u64,
    minor: u64,
    micro: u64,
    qualifier: String,
}

impl Version {
    /// `0.0.0`, the floor of the universal range.
    pub const ZERO: Version = Version {
        latest: false,
        major: 0,
        minor: 0,
        micro: 0,
        qualifier: String::new(),
    };

    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            latest: false,
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// The sentinel that compares greater than any concrete version.
    pub fn latest() -> Self {
        Self {
            latest: true,
            ..Self::default()
        }
    }

    pub fn parse(input: &str) -> Result<Self, DepotError> {
        let s = input.trim();
        let mut parts = s.splitn(4, '.');

        let major = numeric_field(parts.next(), input)?;
        let minor = match parts.next() {
            Some(p) => numeric_field(Some(p), input)?,
            None => 0,
        };
        let micro = match parts.next() {
            Some(p) => numeric_field(Some(p), input)?,
            None => 0,
        };
        let qualifier = match parts.next() {
            Some(q) if is_valid_qualifier(q) => q.to_string(),
            Some(q) => {
                return Err(DepotError::Parse {
                    message: format!("invalid qualifier '{q}' in version '{input}'"),
                })
            }
            None => String::new(),
        };

        Ok(Self {
            latest: false,
            major,
            minor,
            micro,
            qualifier,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn micro(&self) -> u64 {
        self.micro
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn is_latest(&self) -> bool {
        self.latest
    }

    /// The `major.minor.micro` form used for repository file names.
    pub fn without_qualifier(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.micro)
    }
}

fn numeric_field(part: Option<&str>, input: &str) -> Result<u64, DepotError> {
    let part = part.unwrap_or_default();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DepotError::Parse {
            message: format!("invalid version '{input}'"),
        });
    }
    part.parse::<u64>().map_err(|e| DepotError::Parse {
        message: format!("invalid version '{input}': {e}"),
    })
}

fn is_valid_qualifier(q: &str) -> bool {
    !q.is_empty()
        && q
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl FromStr for Version {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.latest {
            return f.write_str(LATEST);
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// An interval over [`Version`] with inclusive or exclusive ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    floor: Version,
    floor_inclusive: bool,
    /// `None` means unbounded.
    ceiling: Option<Version>,
    ceiling_inclusive: bool,
    interval: bool,
}

impl VersionRange {
    /// The `"0"` range, matching every version from `0.0.0` up.
    pub fn any() -> Self {
        Self::at_least(Version::ZERO)
    }

    /// `[floor,∞)`, the meaning of a bare version string.
    pub fn at_least(floor: Version) -> Self {
        Self {
            floor,
            floor_inclusive: true,
            ceiling: None,
            ceiling_inclusive: false,
            interval: false,
        }
    }

    /// Parse `[a,b]`, `[a,b)`, `(a,b]`, `(a,b)` or a bare version.
    pub fn parse(input: &str) -> Result<Self, DepotError> {
        let s = input.trim();
        let invalid = |reason: String| DepotError::InvalidRange {
            input: input.to_string(),
            reason,
        };

        let Some(open) = s.chars().next() else {
            return Err(invalid("empty range".to_string()));
        };
        if open != '[' && open != '(' {
            let floor = Version::parse(s).map_err(|e| invalid(e.to_string()))?;
            return Ok(Self::at_least(floor));
        }

        let close = s.chars().last().unwrap_or(open);
        if s.len() < 2 || (close != ']' && close != ')') {
            return Err(invalid("missing closing ']' or ')'".to_string()));
        }
        let inner = &s[1..s.len() - 1];
        let Some((lower, upper)) = inner.split_once(',') else {
            return Err(invalid("expected 'floor,ceiling'".to_string()));
        };

        let floor = Version::parse(lower).map_err(|e| invalid(e.to_string()))?;
        let ceiling = Version::parse(upper).map_err(|e| invalid(e.to_string()))?;
        if floor > ceiling {
            return Err(invalid(format!("floor {floor} is above ceiling {ceiling}")));
        }

        Ok(Self {
            floor,
            floor_inclusive: open == '[',
            ceiling: Some(ceiling),
            ceiling_inclusive: close == ']',
            interval: true,
        })
    }

    /// Whether this is a true interval rather than a single-version constraint.
    pub fn is_range(&self) -> bool {
        self.interval
    }

    pub fn floor(&self) -> &Version {
        &self.floor
    }

    pub fn ceiling(&self) -> Option<&Version> {
        self.ceiling.as_ref()
    }

    /// The version named by a single-version constraint.
    pub fn single(&self) -> Option<&Version> {
        (!self.interval).then_some(&self.floor)
    }

    pub fn includes(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            version >= &self.floor
        } else {
            version > &self.floor
        };
        if !above_floor {
            return false;
        }
        match &self.ceiling {
            None => true,
            Some(c) if self.ceiling_inclusive => version <= c,
            Some(c) => version < c,
        }
    }
}

impl FromStr for VersionRange {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.ceiling, self.interval) {
            (Some(ceiling), true) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if self.ceiling_inclusive { ']' } else { ')' },
            ),
            _ => write!(f, "{}", self.floor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn basic_ordering() {
        assert!(v("1.0") < v("2.0"));
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.0.1") < v("1.1.0"));
        assert!(v("1.9.9") < v("1.10"));
    }

    #[test]
    fn missing_fields_are_zero() {
        assert_eq!(v("1"), v("1.0.0"));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
    }

    #[test]
    fn qualifier_is_final_tiebreak() {
        assert!(v("1.0.0") < v("1.0.0.a"));
        assert!(v("1.0.0.alpha") < v("1.0.0.beta"));
        assert!(v("1.0.0.zzz") < v("1.0.1"));
    }

    #[test]
    fn latest_beats_everything() {
        assert!(Version::latest() > v("999999.0.0.zzz"));
        assert!(Version::latest().is_latest());
        assert_eq!(Version::latest().to_string(), "latest");
    }

    #[test]
    fn malformed_versions_fail() {
        for bad in ["", "a.b", "1.", "1..2", "1.2.3.", "1.2.3.q!", "-1", "latest"] {
            assert!(Version::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(v("1").to_string(), "1.0.0");
        assert_eq!(v(" 1.2.3.RC1 ").to_string(), "1.2.3.RC1");
        assert_eq!(v("1.2.3.RC1").without_qualifier(), "1.2.3");
    }

    #[test]
    fn range_half_open() {
        let r = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(r.is_range());
        assert!(r.includes(&v("1.0")));
        assert!(r.includes(&v("1.9.9")));
        assert!(!r.includes(&v("2.0")));
        assert!(!r.includes(&v("0.9")));
    }

    #[test]
    fn range_exclusive_floor_inclusive_ceiling() {
        let r = VersionRange::parse("(1.0,2.0]").unwrap();
        assert!(!r.includes(&v("1.0")));
        assert!(r.includes(&v("1.0.0.a")));
        assert!(r.includes(&v("2.0")));
        assert_eq!(r.to_string(), "(1.0.0,2.0.0]");
    }

    #[test]
    fn bare_version_is_open_floor() {
        let r = VersionRange::parse("1.5").unwrap();
        assert!(!r.is_range());
        assert_eq!(r.single(), Some(&v("1.5")));
        assert!(r.ceiling().is_none());
        assert!(r.includes(&v("1.5")));
        assert!(r.includes(&v("100")));
        assert!(!r.includes(&v("1.4.9")));
    }

    #[test]
    fn universal_range() {
        let r = VersionRange::parse("0").unwrap();
        assert_eq!(r, VersionRange::any());
        assert!(r.includes(&Version::ZERO));
        assert!(r.includes(&v("3.2.1")));
    }

    #[test]
    fn malformed_ranges_fail() {
        for bad in ["", "[1.0,2.0", "[1.0]", "[1.0;2.0]", "[x,2.0)", "{1,2}", "[2.0,1.0]"] {
            let err = VersionRange::parse(bad).unwrap_err();
            assert!(
                matches!(err, DepotError::InvalidRange { .. }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn floor_equal_to_ceiling_is_accepted() {
        let r = VersionRange::parse("[1.0,1.0]").unwrap();
        assert!(r.includes(&v("1.0")));
        assert!(!r.includes(&v("1.0.0.a")));
    }

    #[test]
    fn includes_floor_excludes_ceiling_and_is_monotonic() {
        let samples: Vec<Version> = [
            "0", "0.9", "1.0", "1.0.0.a", "1.0.1", "1.5", "1.9.9.z", "2.0", "2.0.0.a", "3",
        ]
        .iter()
        .map(|s| v(s))
        .collect();

        for (floor, ceiling) in [("1.0", "2.0"), ("0", "1.5"), ("1.0.1", "3")] {
            let range = VersionRange::parse(&format!("[{floor},{ceiling})")).unwrap();
            assert!(range.includes(&v(floor)));
            assert!(!range.includes(&v(ceiling)));

            // Over sorted input, membership only flips false -> true -> false.
            let flags: Vec<bool> = samples.iter().map(|s| range.includes(s)).collect();
            let transitions = flags.windows(2).filter(|w| w[0] != w[1]).count();
            assert!(transitions <= 2, "{range}: {flags:?}");
            if let Some(first_in) = flags.iter().position(|f| *f) {
                assert!(flags[first_in..]
                    .iter()
                    .skip_while(|f| **f)
                    .all(|f| !*f));
            }
        }
    }
}
