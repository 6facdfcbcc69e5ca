use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Build targets the audit resolves import settings for.
///
/// `Default` is the fallback platform whose settings apply wherever no
/// explicit per-platform override exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Default,
    Ios,
    Android,
}

impl Platform {
    /// Canonical platform name as it appears in import metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Default => "Default",
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }

    /// The non-default platforms, in evaluation order.
    pub const OVERRIDABLE: [Platform; 2] = [Platform::Ios, Platform::Android];

    pub fn is_default(&self) -> bool {
        matches!(self, Platform::Default)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "ios" | "iphone" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            _ => Err(()),
        }
    }
}
