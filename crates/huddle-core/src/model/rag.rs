use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Traffic-light health tri-state.
///
/// The derived `Ord` ranks `Green < Amber < Red`, so "worst of a set" is
/// simply `max`. Aggregation code relies on this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rag {
    Green,
    Amber,
    Red,
}

impl Rag {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Amber => "amber",
            Self::Red => "red",
        }
    }

    /// The worse of two values.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for Rag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rag {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "amber" => Ok(Self::Amber),
            "red" => Ok(Self::Red),
            _ => Err(ParseEnumError {
                expected: "rag",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rag;
    use std::str::FromStr;

    #[test]
    fn severity_orders_green_amber_red() {
        assert!(Rag::Green < Rag::Amber);
        assert!(Rag::Amber < Rag::Red);
        assert_eq!(Rag::Green.worst(Rag::Red), Rag::Red);
        assert_eq!(Rag::Amber.worst(Rag::Green), Rag::Amber);
        assert_eq!(Rag::Green.worst(Rag::Green), Rag::Green);
    }

    #[test]
    fn json_roundtrips_lowercase() {
        assert_eq!(serde_json::to_string(&Rag::Amber).unwrap(), "\"amber\"");
        assert_eq!(serde_json::from_str::<Rag>("\"red\"").unwrap(), Rag::Red);
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in [Rag::Green, Rag::Amber, Rag::Red] {
            let rendered = value.to_string();
            assert_eq!(Rag::from_str(&rendered).unwrap(), value);
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(Rag::from_str("blue").is_err());
        assert!(Rag::from_str("").is_err());
    }
}
