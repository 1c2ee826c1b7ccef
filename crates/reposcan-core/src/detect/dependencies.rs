// SPDX-License-Identifier: Apache-2.0

//! Dependency risk analysis for JavaScript manifests and lockfiles.
//!
//! The advisory database is embedded JSON with two sections: compromised
//! packages (exact-version matches, supply chain attacks) and CVE
//! advisories (version-range matches). Version comparison is a simple
//! semver triple - prerelease and build metadata are ignored.

use std::sync::LazyLock;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::findings::{DependencyRisk, RiskLevel, finding_id};

/// Embedded advisory database JSON.
const ADVISORIES_JSON: &str = include_str!("advisories.json");

/// Parsed advisory database (initialized once on first use).
static ADVISORY_DATABASE: LazyLock<AdvisoryDatabase> = LazyLock::new(|| {
    serde_json::from_str(ADVISORIES_JSON)
        .expect("Failed to load embedded advisory database - advisories.json is malformed")
});

/// Manifest and lockfile names this analyzer understands.
const MANIFEST_FILES: &[&str] = &["package.json", "package-lock.json", "yarn.lock"];

/// A package with known-compromised releases.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompromisedPackage {
    package: String,
    versions: Vec<String>,
    risk_level: RiskLevel,
    description: String,
    recommended_version: String,
}

/// A published vulnerability advisory with a vulnerable version range.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Advisory {
    package: String,
    vulnerable_ranges: String,
    cve: String,
    risk_level: RiskLevel,
    description: String,
    recommended_version: String,
    advisory_url: String,
}

/// The embedded advisory database.
#[derive(Debug, Deserialize)]
struct AdvisoryDatabase {
    compromised: Vec<CompromisedPackage>,
    advisories: Vec<Advisory>,
}

impl AdvisoryDatabase {
    fn global() -> &'static Self {
        &ADVISORY_DATABASE
    }
}

/// Parses a version string into a `(major, minor, patch)` triple.
///
/// Range operators (`^`, `~`, `>=`, ...) and prerelease/build suffixes are
/// stripped first. Missing components default to zero.
fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let cleaned = clean_version(version);
    let core = cleaned
        .split(['-', '+'])
        .next()
        .unwrap_or(&cleaned);

    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    Some((major, minor, patch))
}

/// Strips range operators and surrounding noise from a version spec.
fn clean_version(version: &str) -> String {
    version
        .trim()
        .trim_start_matches(['^', '~', '>', '<', '=', 'v', ' '])
        .trim()
        .to_string()
}

/// Whether `version` falls inside a vulnerable range expression.
///
/// Supports the forms the advisory feed uses: `<x`, `<=x`, `>=a <b`, and
/// alternation with `||`.
fn version_in_range(version: &str, ranges: &str) -> bool {
    let Some(parsed) = parse_version(version) else {
        return false;
    };

    ranges.split("||").any(|clause| {
        clause
            .split_whitespace()
            .all(|comparator| comparator_matches(parsed, comparator))
    })
}

fn comparator_matches(version: (u64, u64, u64), comparator: &str) -> bool {
    let (op, bound) = if let Some(rest) = comparator.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = comparator.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = comparator.strip_prefix('>') {
        (">", rest)
    } else if let Some(rest) = comparator.strip_prefix('<') {
        ("<", rest)
    } else if let Some(rest) = comparator.strip_prefix('=') {
        ("=", rest)
    } else {
        ("=", comparator)
    };

    let Some(bound) = parse_version(bound) else {
        return false;
    };

    match op {
        ">=" => version >= bound,
        "<=" => version <= bound,
        ">" => version > bound,
        "<" => version < bound,
        _ => version == bound,
    }
}

/// Analyzer that checks declared dependencies against the advisory database.
#[derive(Debug)]
pub struct DependencyAnalyzer {
    database: &'static AdvisoryDatabase,
}

impl DependencyAnalyzer {
    /// Creates an analyzer backed by the embedded advisory database.
    #[must_use]
    pub fn new() -> Self {
        Self {
            database: AdvisoryDatabase::global(),
        }
    }

    /// Whether a file name is a manifest this analyzer can read.
    #[must_use]
    pub fn is_manifest(file_name: &str) -> bool {
        MANIFEST_FILES.contains(&file_name)
    }

    /// Analyzes one manifest or lockfile and returns the risks found.
    ///
    /// Unparseable content yields zero risks - a broken manifest in one
    /// repository must not fail the scan.
    #[must_use]
    pub fn analyze_manifest(&self, file_name: &str, content: &str) -> Vec<DependencyRisk> {
        match file_name {
            "package.json" => self.analyze_package_json(content),
            "package-lock.json" => self.analyze_package_lock(content),
            "yarn.lock" => self.analyze_yarn_lock(content),
            _ => Vec::new(),
        }
    }

    fn analyze_package_json(&self, content: &str) -> Vec<DependencyRisk> {
        let parsed: serde_json::Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable package.json");
                return Vec::new();
            }
        };

        let mut risks = Vec::new();
        for section in ["dependencies", "devDependencies", "peerDependencies"] {
            if let Some(deps) = parsed.get(section).and_then(|v| v.as_object()) {
                for (name, spec) in deps {
                    if let Some(version) = spec.as_str() {
                        risks.extend(self.analyze_package(name, &clean_version(version)));
                    }
                }
            }
        }
        risks
    }

    fn analyze_package_lock(&self, content: &str) -> Vec<DependencyRisk> {
        let parsed: serde_json::Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable package-lock.json");
                return Vec::new();
            }
        };

        let mut risks = Vec::new();

        // Lockfile v2/v3: a flat "packages" map keyed by install path.
        if let Some(packages) = parsed.get("packages").and_then(|v| v.as_object()) {
            for (path, entry) in packages {
                let Some(name) = package_name_from_path(path) else {
                    continue;
                };
                if let Some(version) = entry.get("version").and_then(|v| v.as_str()) {
                    risks.extend(self.analyze_package(name, version));
                }
            }
        }

        // Lockfile v1: a nested "dependencies" tree.
        if let Some(dependencies) = parsed.get("dependencies").and_then(|v| v.as_object()) {
            self.collect_legacy_lock_risks(dependencies, &mut risks);
        }

        risks
    }

    fn collect_legacy_lock_risks(
        &self,
        dependencies: &serde_json::Map<String, serde_json::Value>,
        risks: &mut Vec<DependencyRisk>,
    ) {
        for (name, entry) in dependencies {
            if let Some(version) = entry.get("version").and_then(|v| v.as_str()) {
                risks.extend(self.analyze_package(name, version));
            }
            if let Some(nested) = entry.get("dependencies").and_then(|v| v.as_object()) {
                self.collect_legacy_lock_risks(nested, risks);
            }
        }
    }

    fn analyze_yarn_lock(&self, content: &str) -> Vec<DependencyRisk> {
        let mut risks = Vec::new();
        let mut current_package: Option<String> = None;

        for line in content.lines() {
            if !line.starts_with(' ') && line.trim_end().ends_with(':') {
                current_package = yarn_entry_package_name(line);
            } else if let Some(name) = &current_package
                && let Some(version) = yarn_entry_version(line)
            {
                risks.extend(self.analyze_package(name, version));
            }
        }

        risks
    }

    /// Checks one resolved package version against the advisory database.
    #[must_use]
    pub fn analyze_package(&self, name: &str, version: &str) -> Vec<DependencyRisk> {
        let mut risks = Vec::new();
        let resolved = clean_version(version);

        for compromised in &self.database.compromised {
            if compromised.package == name && compromised.versions.iter().any(|v| *v == resolved) {
                debug!(package = %name, version = %resolved, "Compromised package version");
                risks.push(DependencyRisk {
                    id: finding_id(&[name, &resolved, "compromised"]),
                    package: name.to_string(),
                    version: resolved.clone(),
                    risk_level: compromised.risk_level,
                    vulnerability: "Compromised Package".to_string(),
                    cve: None,
                    advisory_url: None,
                    recommended_version: compromised.recommended_version.clone(),
                    description: compromised.description.clone(),
                });
            }
        }

        for advisory in &self.database.advisories {
            if advisory.package == name && version_in_range(&resolved, &advisory.vulnerable_ranges)
            {
                debug!(package = %name, version = %resolved, cve = %advisory.cve, "Vulnerable package version");
                risks.push(DependencyRisk {
                    id: finding_id(&[name, &resolved, "vulnerable"]),
                    package: name.to_string(),
                    version: resolved.clone(),
                    risk_level: advisory.risk_level,
                    vulnerability: advisory.cve.clone(),
                    cve: Some(advisory.cve.clone()),
                    advisory_url: Some(advisory.advisory_url.clone()),
                    recommended_version: advisory.recommended_version.clone(),
                    description: advisory.description.clone(),
                });
            }
        }

        risks
    }

    /// Number of entries in the advisory database, for diagnostics.
    #[must_use]
    pub fn advisory_count(&self) -> usize {
        self.database.compromised.len() + self.database.advisories.len()
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a package name from a lockfile v2 install path.
///
/// `node_modules/@scope/pkg` and nested `node_modules/a/node_modules/b`
/// both resolve to the segment after the last `node_modules/`. The root
/// entry (empty path) carries the project itself and is skipped.
fn package_name_from_path(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    path.rsplit_once("node_modules/")
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}

/// Extracts the package name from a yarn.lock entry header line.
///
/// Headers look like `lodash@^4.17.20:` or `"@scope/pkg@^1.0.0":`, with
/// multiple comma-separated specs sharing one entry.
fn yarn_entry_package_name(line: &str) -> Option<String> {
    let first_spec = line
        .trim_end_matches(':')
        .split(',')
        .next()?
        .trim()
        .trim_matches('"');

    // Scoped packages keep their leading @, so split at the last @.
    let at = first_spec.rfind('@').filter(|&i| i > 0)?;
    Some(first_spec[..at].to_string())
}

/// Extracts the resolved version from a yarn.lock `version "x.y.z"` line.
fn yarn_entry_version(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("version ")
        .map(|rest| rest.trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_database_loads() {
        let analyzer = DependencyAnalyzer::new();
        assert!(analyzer.advisory_count() >= 10);
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("4.17.21"), Some((4, 17, 21)));
        assert_eq!(parse_version("^1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_version("2.0"), Some((2, 0, 0)));
        assert_eq!(parse_version("1.0.0-beta.1"), Some((1, 0, 0)));
        assert_eq!(parse_version("not-a-version"), None);
    }

    #[test]
    fn test_version_in_range_simple_upper_bound() {
        assert!(version_in_range("4.17.20", "<4.17.21"));
        assert!(!version_in_range("4.17.21", "<4.17.21"));
    }

    #[test]
    fn test_version_in_range_compound() {
        let ranges = "<0.21.2 || >=1.0.0 <1.6.0";
        assert!(version_in_range("0.21.1", ranges));
        assert!(version_in_range("1.5.0", ranges));
        assert!(!version_in_range("0.21.2", ranges));
        assert!(!version_in_range("1.6.0", ranges));
    }

    #[test]
    fn test_is_manifest() {
        assert!(DependencyAnalyzer::is_manifest("package.json"));
        assert!(DependencyAnalyzer::is_manifest("yarn.lock"));
        assert!(!DependencyAnalyzer::is_manifest("Cargo.toml"));
    }

    #[test]
    fn test_analyze_package_json_finds_vulnerable_range() {
        let analyzer = DependencyAnalyzer::new();
        let content = r#"{"dependencies": {"lodash": "^4.17.20"}}"#;

        let risks = analyzer.analyze_manifest("package.json", content);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].package, "lodash");
        assert_eq!(risks[0].cve.as_deref(), Some("CVE-2021-23337"));
        assert_eq!(risks[0].recommended_version, "4.17.21");
    }

    #[test]
    fn test_analyze_package_json_clean_dependencies() {
        let analyzer = DependencyAnalyzer::new();
        let content = r#"{"dependencies": {"lodash": "4.17.21", "react": "18.2.0"}}"#;

        let risks = analyzer.analyze_manifest("package.json", content);
        assert!(risks.is_empty());
    }

    #[test]
    fn test_analyze_package_json_dev_dependencies_included() {
        let analyzer = DependencyAnalyzer::new();
        let content = r#"{"devDependencies": {"eslint-config-prettier": "9.1.1"}}"#;

        let risks = analyzer.analyze_manifest("package.json", content);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].risk_level, RiskLevel::Critical);
        assert_eq!(risks[0].vulnerability, "Compromised Package");
        assert!(risks[0].cve.is_none());
    }

    #[test]
    fn test_analyze_malformed_manifest_yields_nothing() {
        let analyzer = DependencyAnalyzer::new();
        assert!(
            analyzer
                .analyze_manifest("package.json", "{not json")
                .is_empty()
        );
    }

    #[test]
    fn test_analyze_package_lock_v2() {
        let analyzer = DependencyAnalyzer::new();
        let content = r#"{
            "lockfileVersion": 2,
            "packages": {
                "": {"name": "app", "version": "1.0.0"},
                "node_modules/minimist": {"version": "1.2.5"},
                "node_modules/a/node_modules/glob-parent": {"version": "5.1.1"}
            }
        }"#;

        let risks = analyzer.analyze_manifest("package-lock.json", content);
        let packages: Vec<&str> = risks.iter().map(|r| r.package.as_str()).collect();
        assert!(packages.contains(&"minimist"));
        assert!(packages.contains(&"glob-parent"));
    }

    #[test]
    fn test_analyze_package_lock_legacy_nested() {
        let analyzer = DependencyAnalyzer::new();
        let content = r#"{
            "dependencies": {
                "wrapper": {
                    "version": "1.0.0",
                    "dependencies": {
                        "event-stream": {"version": "3.3.6"}
                    }
                }
            }
        }"#;

        let risks = analyzer.analyze_manifest("package-lock.json", content);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].package, "event-stream");
        assert_eq!(risks[0].risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_analyze_yarn_lock() {
        let analyzer = DependencyAnalyzer::new();
        let content = concat!(
            "# yarn lockfile v1\n",
            "\n",
            "lodash@^4.17.20:\n",
            "  version \"4.17.20\"\n",
            "  resolved \"https://registry.yarnpkg.com/lodash/-/lodash-4.17.20.tgz\"\n",
            "\n",
            "\"@scope/safe@^1.0.0\":\n",
            "  version \"1.0.0\"\n",
        );

        let risks = analyzer.analyze_manifest("yarn.lock", content);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].package, "lodash");
        assert_eq!(risks[0].version, "4.17.20");
    }

    #[test]
    fn test_yarn_entry_package_name_scoped() {
        assert_eq!(
            yarn_entry_package_name("\"@scope/pkg@^1.0.0\":").as_deref(),
            Some("@scope/pkg")
        );
        assert_eq!(
            yarn_entry_package_name("lodash@^4.17.20, lodash@^4.17.15:").as_deref(),
            Some("lodash")
        );
    }

    #[test]
    fn test_package_name_from_path() {
        assert_eq!(
            package_name_from_path("node_modules/@scope/pkg"),
            Some("@scope/pkg")
        );
        assert_eq!(
            package_name_from_path("node_modules/a/node_modules/b"),
            Some("b")
        );
        assert_eq!(package_name_from_path(""), None);
    }

    #[test]
    fn test_risk_ids_distinguish_kind() {
        let analyzer = DependencyAnalyzer::new();
        let risks = analyzer.analyze_package("lodash", "4.17.20");
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].id.len(), 32);
    }
}
