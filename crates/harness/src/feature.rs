//! Feature files.
//!
//! Parses Gherkin with the `gherkin` crate and flattens each feature into
//! runnable [`ScenarioSpec`]s: background steps are prepended to every
//! scenario and feature tags are inherited.

use crate::result::{HarnessError, HarnessResult};
use gherkin::GherkinEnv;
use std::path::{Path, PathBuf};

/// Tags that mark a scenario as not to be run
pub const SKIP_TAGS: [&str; 2] = ["skip", "wip"];

/// Data table attached to a step: a header row followed by data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Build from raw rows, the first being the header
    #[must_use]
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        Self { header, rows }
    }

    /// Column headings
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, header excluded
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the column with this heading
    ///
    /// # Errors
    ///
    /// Returns an assertion error if no column has this heading.
    pub fn column(&self, heading: &str) -> HarnessResult<Vec<&str>> {
        let index = self
            .header
            .iter()
            .position(|h| h.trim() == heading)
            .ok_or_else(|| {
                HarnessError::assertion(format!(
                    "data table has no column '{heading}' (columns: {:?})",
                    self.header
                ))
            })?;
        Ok(self.column_at(index))
    }

    /// Values of the column at `index`; short rows yield nothing
    #[must_use]
    pub fn column_at(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index))
            .map(|cell| cell.trim())
            .collect()
    }

    /// Value in `row` under `heading`
    #[must_use]
    pub fn cell(&self, row: usize, heading: &str) -> Option<&str> {
        let index = self.header.iter().position(|h| h.trim() == heading)?;
        self.rows.get(row)?.get(index).map(|cell| cell.trim())
    }
}

/// One step as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    /// `Given`, `When`, `Then`, `And`, `But`
    pub keyword: String,
    /// Step text without the keyword
    pub text: String,
    /// Attached data table
    pub table: Option<DataTable>,
}

impl std::fmt::Display for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.keyword.trim(), self.text)
    }
}

/// A scenario ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    /// Owning feature name
    pub feature: String,
    /// Scenario name
    pub name: String,
    /// Own and inherited tags, without `@`
    pub tags: Vec<String>,
    /// Background steps followed by the scenario's own
    pub steps: Vec<StepSpec>,
    /// Source file
    pub path: PathBuf,
    /// Line of the `Scenario:` keyword
    pub line: usize,
}

impl ScenarioSpec {
    /// Test case id: name before `" - "`
    #[must_use]
    pub fn tc_id(&self) -> &str {
        crate::reporter::tc_id(&self.name)
    }

    /// Whether the scenario carries a tag (with or without `@`)
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Whether the scenario is tagged `@skip` or `@wip`
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        SKIP_TAGS.iter().any(|tag| self.has_tag(tag))
    }
}

/// A parsed feature file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFile {
    /// Source file
    pub path: PathBuf,
    /// Feature name
    pub name: String,
    /// Runnable scenarios, in file order
    pub scenarios: Vec<ScenarioSpec>,
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('@').to_string()
}

fn convert_steps(steps: &[gherkin::Step]) -> Vec<StepSpec> {
    steps
        .iter()
        .map(|step| StepSpec {
            keyword: step.keyword.trim().to_string(),
            text: step.value.trim().to_string(),
            table: step.table.as_ref().map(|t| DataTable::from_rows(t.rows.clone())),
        })
        .collect()
}

fn flatten(feature: &gherkin::Feature, path: &Path) -> HarnessResult<FeatureFile> {
    let background = feature
        .background
        .as_ref()
        .map(|b| convert_steps(&b.steps))
        .unwrap_or_default();
    let feature_tags: Vec<String> = feature.tags.iter().map(|t| normalize_tag(t)).collect();

    let mut scenarios = Vec::new();
    let ruled = feature.rules.iter().flat_map(|rule| {
        rule.scenarios.iter().map(move |s| (Some(rule), s))
    });
    for (rule, scenario) in feature.scenarios.iter().map(|s| (None, s)).chain(ruled) {
        if !scenario.examples.is_empty() {
            return Err(HarnessError::Gherkin {
                path: path.display().to_string(),
                message: format!("scenario outline '{}' is not supported", scenario.name),
            });
        }
        let mut steps = background.clone();
        if let Some(rule) = rule {
            if let Some(ref rule_background) = rule.background {
                steps.extend(convert_steps(&rule_background.steps));
            }
        }
        steps.extend(convert_steps(&scenario.steps));

        let mut tags = feature_tags.clone();
        if let Some(rule) = rule {
            tags.extend(rule.tags.iter().map(|t| normalize_tag(t)));
        }
        tags.extend(scenario.tags.iter().map(|t| normalize_tag(t)));

        scenarios.push(ScenarioSpec {
            feature: feature.name.trim().to_string(),
            name: scenario.name.trim().to_string(),
            tags,
            steps,
            path: path.to_path_buf(),
            line: scenario.position.line,
        });
    }

    Ok(FeatureFile {
        path: path.to_path_buf(),
        name: feature.name.trim().to_string(),
        scenarios,
    })
}

/// Parse feature source text
///
/// # Errors
///
/// Returns [`HarnessError::Gherkin`] for syntax errors and scenario outlines.
pub fn parse_feature(source: &str, path: &Path) -> HarnessResult<FeatureFile> {
    let feature = gherkin::Feature::parse(source, GherkinEnv::default()).map_err(|e| {
        HarnessError::Gherkin {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;
    flatten(&feature, path)
}

/// Load one feature file
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or
/// [`HarnessError::Gherkin`] if it does not parse.
pub fn load_feature(path: &Path) -> HarnessResult<FeatureFile> {
    let source = std::fs::read_to_string(path)?;
    parse_feature(&source, path)
}

/// Expand files and directories into `.feature` files, sorted per directory
///
/// # Errors
///
/// Returns an error if a path does not exist or a directory cannot be read.
pub fn discover(paths: &[PathBuf]) -> HarnessResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<Result<Vec<_>, _>>()?;
            entries.sort();
            for entry in entries {
                if entry.is_dir() {
                    found.extend(discover(&[entry])?);
                } else if entry.extension().is_some_and(|ext| ext == "feature") {
                    found.push(entry);
                }
            }
        } else if path.is_file() {
            found.push(path.clone());
        } else {
            return Err(HarnessError::config(format!(
                "feature path not found: {}",
                path.display()
            )));
        }
    }
    Ok(found)
}

/// Load every feature under `paths`
///
/// # Errors
///
/// Returns the first discovery or parse failure.
pub fn load_features(paths: &[PathBuf]) -> HarnessResult<Vec<FeatureFile>> {
    discover(paths)?.iter().map(|p| load_feature(p)).collect()
}

/// Scenario selection from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    include_tags: Vec<String>,
    exclude_tags: Vec<String>,
    name: Option<String>,
}

impl ScenarioFilter {
    /// Select everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tag expressions: `smoke`, `@smoke`, `~@slow` or `-slow` to exclude;
    /// comma-separated lists are split
    #[must_use]
    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        for tag in tags.iter().flat_map(|t| t.as_ref().split(',')) {
            let tag = tag.trim();
            if let Some(excluded) = tag.strip_prefix('~').or_else(|| tag.strip_prefix('-')) {
                self.exclude_tags.push(normalize_tag(excluded));
            } else if !tag.is_empty() {
                self.include_tags.push(normalize_tag(tag));
            }
        }
        self
    }

    /// Keep scenarios whose name contains `fragment` (case-insensitive)
    #[must_use]
    pub fn with_name(mut self, fragment: impl Into<String>) -> Self {
        self.name = Some(fragment.into().to_lowercase());
        self
    }

    /// Whether a scenario is selected
    #[must_use]
    pub fn matches(&self, scenario: &ScenarioSpec) -> bool {
        if self.exclude_tags.iter().any(|t| scenario.has_tag(t)) {
            return false;
        }
        if !self.include_tags.is_empty() && !self.include_tags.iter().any(|t| scenario.has_tag(t)) {
            return false;
        }
        self.name
            .as_ref()
            .map_or(true, |fragment| scenario.name.to_lowercase().contains(fragment))
    }

    /// Selected scenarios of `features`, in order
    #[must_use]
    pub fn select<'f>(&self, features: &'f [FeatureFile]) -> Vec<&'f ScenarioSpec> {
        features
            .iter()
            .flat_map(|f| f.scenarios.iter())
            .filter(|s| self.matches(s))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"@ui
Feature: Check Box

  Background:
    Given the user has launched the DEMOQA application
    And the user clicks on "Elements" card

  @smoke
  Scenario: TC_CB_01 - Expand all
    When the user clicks on the expand all (+) button
    Then the following nodes should be visible
      | Node    |
      | Desktop |
      | Notes   |

  @wip
  Scenario: TC_CB_02 - Not ready
    When the user loads the page
"#;

    fn parsed() -> FeatureFile {
        parse_feature(SOURCE, Path::new("features/checkbox.feature")).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_background_prepended() {
            let feature = parsed();
            assert_eq!(feature.name, "Check Box");
            assert_eq!(feature.scenarios.len(), 2);

            let first = &feature.scenarios[0];
            assert_eq!(first.steps.len(), 4);
            assert_eq!(first.steps[0].text, "the user has launched the DEMOQA application");
            assert_eq!(first.steps[1].keyword, "And");
            assert_eq!(first.steps[2].text, "the user clicks on the expand all (+) button");
            assert_eq!(first.tc_id(), "TC_CB_01");
        }

        #[test]
        fn test_tables_keep_header() {
            let feature = parsed();
            let table = feature.scenarios[0].steps[3].table.as_ref().unwrap();
            assert_eq!(table.header(), ["Node"]);
            assert_eq!(table.column("Node").unwrap(), vec!["Desktop", "Notes"]);
            assert_eq!(table.column_at(0), vec!["Desktop", "Notes"]);
            assert_eq!(table.cell(1, "Node"), Some("Notes"));
            assert!(table.column("Missing").is_err());
        }

        #[test]
        fn test_tags_inherited() {
            let feature = parsed();
            assert!(feature.scenarios[0].has_tag("@ui"));
            assert!(feature.scenarios[0].has_tag("smoke"));
            assert!(!feature.scenarios[0].is_skipped());
            assert!(feature.scenarios[1].is_skipped());
        }

        #[test]
        fn test_outline_rejected() {
            let source = "Feature: F\n  Scenario Outline: O\n    Given a <x>\n    \
                          Examples:\n      | x |\n      | 1 |\n";
            assert!(matches!(
                parse_feature(source, Path::new("f.feature")),
                Err(HarnessError::Gherkin { .. })
            ));
        }

        #[test]
        fn test_syntax_error() {
            assert!(parse_feature("not gherkin at all", Path::new("bad.feature")).is_err());
        }
    }

    mod filtering {
        use super::*;

        #[test]
        fn test_tag_filters() {
            let feature = parsed();
            let smoke = ScenarioFilter::new().with_tags(&["@smoke"]);
            assert_eq!(smoke.select(std::slice::from_ref(&feature)).len(), 1);

            let not_wip = ScenarioFilter::new().with_tags(&["~@wip"]);
            let selected = not_wip.select(std::slice::from_ref(&feature));
            assert_eq!(selected.len(), 1);
            assert_eq!(selected[0].tc_id(), "TC_CB_01");

            let either = ScenarioFilter::new().with_tags(&["smoke,wip"]);
            assert_eq!(either.select(std::slice::from_ref(&feature)).len(), 2);
        }

        #[test]
        fn test_name_filter() {
            let feature = parsed();
            let filter = ScenarioFilter::new().with_name("EXPAND");
            let selected = filter.select(std::slice::from_ref(&feature));
            assert_eq!(selected.len(), 1);
            assert!(ScenarioFilter::new().matches(&feature.scenarios[1]));
        }
    }

    mod files {
        use super::*;

        #[test]
        fn test_discover_and_load() {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::create_dir(tmp.path().join("nested")).unwrap();
            std::fs::write(tmp.path().join("b.feature"), SOURCE).unwrap();
            std::fs::write(tmp.path().join("nested/a.feature"), SOURCE).unwrap();
            std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

            let found = discover(&[tmp.path().to_path_buf()]).unwrap();
            assert_eq!(found.len(), 2);
            assert!(found.iter().all(|p| p.extension().unwrap() == "feature"));

            let features = load_features(&[tmp.path().to_path_buf()]).unwrap();
            assert_eq!(features.len(), 2);
            assert_eq!(features[0].scenarios[0].path, found[0]);
        }

        #[test]
        fn test_missing_path() {
            let missing = PathBuf::from("/definitely/not/here.feature");
            assert!(matches!(discover(&[missing]), Err(HarnessError::Config { .. })));
        }
    }
}
