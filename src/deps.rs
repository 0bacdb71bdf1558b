use std::collections::BTreeMap;
use std::fmt;

use crate::error::GenerateError;
use crate::model::Snapshot;

/// Every generated project starts from this set: network client, local
/// key-value persistence, URL opening, platform icons.
pub const BASE_DEPENDENCIES: &[(&str, &str)] = &[
    ("http", "^1.1.0"),
    ("shared_preferences", "^2.2.2"),
    ("url_launcher", "^6.2.1"),
    ("cupertino_icons", "^1.0.6"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        let patch = parts.next().unwrap_or("0").parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor, patch })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A pub-style version constraint. `Any` is the wildcard; `Caret` is the
/// usual compatible-range; `Exact` pins one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Any,
    Caret(Version),
    Exact(Version),
}

impl Constraint {
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() || s == "any" {
            return Some(Constraint::Any);
        }
        if let Some(rest) = s.strip_prefix('^') {
            return Version::parse(rest).map(Constraint::Caret);
        }
        Version::parse(s).map(Constraint::Exact)
    }

    /// Caret semantics as pub defines them: same major, and for 0.x also
    /// the same minor, at or above the base version.
    fn caret_contains(base: Version, v: Version) -> bool {
        if v < base {
            return false;
        }
        if base.major == 0 {
            v.major == 0 && v.minor == base.minor
        } else {
            v.major == base.major
        }
    }

    /// Merge a newly declared constraint into an existing one. Specific
    /// beats wildcard; overlapping ranges keep the tighter one; disjoint
    /// specifics are a conflict.
    pub fn merge(self, declared: Constraint) -> Result<Constraint, ()> {
        use Constraint::*;
        match (self, declared) {
            (Any, c) => Ok(c),
            (c, Any) => Ok(c),
            (Caret(a), Caret(b)) => {
                if Self::caret_contains(a, b) {
                    Ok(Caret(b))
                } else if Self::caret_contains(b, a) {
                    Ok(Caret(a))
                } else {
                    Err(())
                }
            }
            (Caret(range), Exact(pin)) | (Exact(pin), Caret(range)) => {
                if Self::caret_contains(range, pin) {
                    Ok(Exact(pin))
                } else {
                    Err(())
                }
            }
            (Exact(a), Exact(b)) => {
                if a == b {
                    Ok(Exact(a))
                } else {
                    Err(())
                }
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => write!(f, "any"),
            Constraint::Caret(v) => write!(f, "^{v}"),
            Constraint::Exact(v) => write!(f, "{v}"),
        }
    }
}

/// Merge the application's declared extensions over the base dependency
/// set, keyed by package name.
pub fn aggregate(snap: &Snapshot) -> Result<BTreeMap<String, String>, GenerateError> {
    let mut merged: BTreeMap<String, Constraint> = BTreeMap::new();
    for (name, constraint) in BASE_DEPENDENCIES {
        let parsed = Constraint::parse(constraint).expect("base constraint is well-formed");
        merged.insert((*name).to_string(), parsed);
    }

    for ext in &snap.extensions {
        let declared = match &ext.version {
            None => Constraint::Any,
            Some(raw) => Constraint::parse(raw).ok_or_else(|| GenerateError::SchemaViolation {
                detail: format!("extension '{}' has malformed version '{raw}'", ext.package),
            })?,
        };

        match merged.get(&ext.package) {
            None => {
                merged.insert(ext.package.clone(), declared);
            }
            Some(existing) => {
                let combined = existing.merge(declared).map_err(|_| GenerateError::DependencyConflict {
                    package: ext.package.clone(),
                    existing: existing.to_string(),
                    declared: declared.to_string(),
                })?;
                merged.insert(ext.package.clone(), combined);
            }
        }
    }

    Ok(merged.into_iter().map(|(k, v)| (k, v.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Extension;

    fn snapshot_with(extensions: Vec<Extension>) -> Snapshot {
        let mut snap: Snapshot = serde_json::from_str(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"}
            }"#,
        )
        .unwrap();
        snap.extensions = extensions;
        snap
    }

    fn ext(package: &str, version: Option<&str>) -> Extension {
        Extension {
            package: package.to_string(),
            version: version.map(str::to_string),
            class_name: None,
            import: None,
        }
    }

    #[test]
    fn tighter_caret_wins_over_base() {
        let snap = snapshot_with(vec![ext("http", Some("^1.2.0"))]);
        let deps = aggregate(&snap).unwrap();
        assert_eq!(deps.get("http").unwrap(), "^1.2.0");
    }

    #[test]
    fn incompatible_exact_conflicts_with_base_range() {
        let snap = snapshot_with(vec![ext("http", Some("2.0.0"))]);
        let err = aggregate(&snap).unwrap_err();
        assert!(matches!(err, GenerateError::DependencyConflict { .. }));
    }

    #[test]
    fn compatible_exact_pins_within_range() {
        let snap = snapshot_with(vec![ext("http", Some("1.3.1"))]);
        let deps = aggregate(&snap).unwrap();
        assert_eq!(deps.get("http").unwrap(), "1.3.1");
    }

    #[test]
    fn wildcard_extension_defers_to_any_specific() {
        let snap = snapshot_with(vec![
            ext("flutter_staggered_grid_view", None),
            ext("flutter_staggered_grid_view", Some("^0.7.0")),
        ]);
        let deps = aggregate(&snap).unwrap();
        assert_eq!(deps.get("flutter_staggered_grid_view").unwrap(), "^0.7.0");
    }

    #[test]
    fn zero_major_carets_are_minor_scoped() {
        let base = Constraint::parse("^0.6.0").unwrap();
        assert!(base.merge(Constraint::parse("^0.7.0").unwrap()).is_err());
        assert_eq!(
            base.merge(Constraint::parse("0.6.4").unwrap()).unwrap(),
            Constraint::parse("0.6.4").unwrap()
        );
    }

    #[test]
    fn unrelated_packages_pass_through() {
        let snap = snapshot_with(vec![ext("carousel_slider", Some("^4.2.1"))]);
        let deps = aggregate(&snap).unwrap();
        assert_eq!(deps.get("carousel_slider").unwrap(), "^4.2.1");
        assert_eq!(deps.get("shared_preferences").unwrap(), "^2.2.2");
    }
}
