//! Snapshot tiers (retention classes).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Auto,
    Safety,
    Manual,
    Imported,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Auto, Tier::Safety, Tier::Manual, Tier::Imported];

    /// Tiers subject to automatic eviction.
    pub const CAPPED: [Tier; 3] = [Tier::Auto, Tier::Safety, Tier::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Auto => "auto",
            Tier::Safety => "safety",
            Tier::Manual => "manual",
            Tier::Imported => "imported",
        }
    }

    #[inline]
    pub fn is_evictable(&self) -> bool {
        !matches!(self, Tier::Imported)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Tier::Auto),
            "safety" => Ok(Tier::Safety),
            "manual" => Ok(Tier::Manual),
            "imported" => Ok(Tier::Imported),
            other => Err(format!(
                "unknown tier '{other}' (expected auto|safety|manual|imported)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Manual".parse::<Tier>().unwrap(), Tier::Manual);
        assert_eq!(" safety ".parse::<Tier>().unwrap(), Tier::Safety);
        assert!("weekly".parse::<Tier>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let s = serde_json::to_string(&Tier::Imported).unwrap();
        assert_eq!(s, "\"imported\"");
        let t: Tier = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(t, Tier::Auto);
    }

    #[test]
    fn only_imported_is_exempt() {
        for t in Tier::CAPPED {
            assert!(t.is_evictable());
        }
        assert!(!Tier::Imported.is_evictable());
    }
}
