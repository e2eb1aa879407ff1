//! Logical package identity and display tiers.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Revision-independent identity of a package.
///
/// Two records with equal keys describe the same package at (possibly)
/// different revisions. The [`Ord`] implementation is the display order used
/// inside every category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PackageKey {
    Tool,
    PlatformTool,
    Platform {
        api_level: u32,
    },
    /// Addons are tied to the platform they extend.
    Addon {
        api_level: u32,
        vendor: String,
        name: String,
    },
    Extra {
        vendor: String,
        path: String,
    },
}

impl PackageKey {
    /// The tier this package is grouped under when sorting by API.
    pub fn tier(&self) -> Tier {
        match self {
            PackageKey::Tool | PackageKey::PlatformTool => Tier::Tools,
            PackageKey::Platform { api_level } | PackageKey::Addon { api_level, .. } => {
                Tier::Api(*api_level)
            }
            PackageKey::Extra { .. } => Tier::Extras,
        }
    }

    /// Position inside a tier: tools before platform-tools, platforms before addons.
    fn rank(&self) -> u8 {
        match self {
            PackageKey::Tool => 0,
            PackageKey::PlatformTool => 1,
            PackageKey::Platform { .. } => 2,
            PackageKey::Addon { .. } => 3,
            PackageKey::Extra { .. } => 4,
        }
    }

    /// Label used when a record carries no explicit description.
    pub fn default_label(&self, version_name: Option<&str>) -> String {
        match self {
            PackageKey::Tool => "Android SDK Tools".to_string(),
            PackageKey::PlatformTool => "Android SDK Platform-tools".to_string(),
            PackageKey::Platform { api_level } => {
                let version = version_name
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("API {}", api_level));
                format!("SDK Platform Android {}, API {}", version, api_level)
            }
            PackageKey::Addon {
                api_level,
                vendor,
                name,
            } => format!("{} by {}, Android API {}", name, vendor, api_level),
            PackageKey::Extra { vendor, path } => {
                format!("{} {} package", title_case(vendor), title_case(path))
            }
        }
    }
}

impl Ord for PackageKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier()
            .cmp(&other.tier())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (
                    PackageKey::Addon {
                        vendor: v1,
                        name: n1,
                        ..
                    },
                    PackageKey::Addon {
                        vendor: v2,
                        name: n2,
                        ..
                    },
                ) => n1.cmp(n2).then_with(|| v1.cmp(v2)),
                (
                    PackageKey::Extra {
                        vendor: v1,
                        path: p1,
                    },
                    PackageKey::Extra {
                        vendor: v2,
                        path: p2,
                    },
                ) => v1.cmp(v2).then_with(|| p1.cmp(p2)),
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for PackageKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageKey::Tool => write!(f, "tool"),
            PackageKey::PlatformTool => write!(f, "platform-tool"),
            PackageKey::Platform { api_level } => write!(f, "platform-{}", api_level),
            PackageKey::Addon {
                api_level,
                vendor,
                name,
            } => write!(f, "addon-{}-{}-{}", vendor, name, api_level),
            PackageKey::Extra { vendor, path } => write!(f, "extra-{}-{}", vendor, path),
        }
    }
}

/// API tier used as the category key when sorting by API.
///
/// Ordered with `Tools` first, API levels descending, and `Extras` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tools,
    Api(u32),
    Extras,
}

impl Ord for Tier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Tier::Api(a), Tier::Api(b)) => b.cmp(a),
            _ => self.position().cmp(&other.position()),
        }
    }
}

impl PartialOrd for Tier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Tier {
    fn position(&self) -> u8 {
        match self {
            Tier::Tools => 0,
            Tier::Api(_) => 1,
            Tier::Extras => 2,
        }
    }

    /// Tools and Extras are shown even when they hold nothing.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Tier::Tools | Tier::Extras)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Tools => write!(f, "TOOLS"),
            Tier::Api(level) => write!(f, "API {}", level),
            Tier::Extras => write!(f, "EXTRAS"),
        }
    }
}

fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
