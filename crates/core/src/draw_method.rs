use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which node a pile draw removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMethod {
    /// The head of the pile.
    Top,
    /// The tail of the pile; its predecessor becomes the new tail.
    Bottom,
    /// Any node, chosen uniformly.
    Random,
}

impl DrawMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DrawMethod::Top => "top",
            DrawMethod::Bottom => "bottom",
            DrawMethod::Random => "random",
        }
    }
}

impl fmt::Display for DrawMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(DrawMethod::Top),
            "bottom" => Ok(DrawMethod::Bottom),
            "random" => Ok(DrawMethod::Random),
            other => Err(CoreError::InvalidParameter(format!(
                "unknown draw method '{other}' (expected top, bottom or random)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_known_methods() {
        assert_eq!("top".parse::<DrawMethod>().unwrap(), DrawMethod::Top);
        assert_eq!(" Bottom ".parse::<DrawMethod>().unwrap(), DrawMethod::Bottom);
        assert_eq!("RANDOM".parse::<DrawMethod>().unwrap(), DrawMethod::Random);
    }

    #[test]
    fn unknown_method_is_invalid_parameter() {
        assert_matches!("middle".parse::<DrawMethod>(), Err(CoreError::InvalidParameter(_)));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for method in [DrawMethod::Top, DrawMethod::Bottom, DrawMethod::Random] {
            assert_eq!(method.to_string().parse::<DrawMethod>().unwrap(), method);
        }
    }
}
