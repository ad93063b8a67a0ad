//! The versioned fixture table

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{FixtureError, Result};
use crate::types::{Category, Fixture};

/// Fixture file format version understood by this crate
pub const FORMAT_VERSION: u32 = 1;

const BUNDLED: &str = include_str!("../data/translations.yaml");

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+_[A-Za-z]+_\d{4}$").expect("static id pattern"));

/// On-disk layout of the fixture file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    version: u32,
    #[serde(default)]
    positive: Vec<Fixture>,
    #[serde(default)]
    negative: Vec<Fixture>,
    #[serde(default)]
    ui: Vec<Fixture>,
}

/// Immutable fixture table, partitioned by category in insertion order
#[derive(Debug, Clone)]
pub struct FixtureTable {
    version: u32,
    positive: Vec<Fixture>,
    negative: Vec<Fixture>,
    ui: Vec<Fixture>,
    digest: String,
}

/// Subset of the table to execute. Empty lists select everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub ids: Vec<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, category: Category, fixture: &Fixture) -> bool {
        (self.categories.is_empty() || self.categories.contains(&category))
            && (self.ids.is_empty() || self.ids.iter().any(|id| id == &fixture.id))
    }
}

impl FixtureTable {
    /// The table shipped with this crate
    pub fn bundled() -> Result<Self> {
        Self::from_yaml(BUNDLED)
    }

    /// Parse and validate a fixture table from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawTable = serde_yaml::from_str(yaml)?;

        if raw.version != FORMAT_VERSION {
            return Err(FixtureError::UnsupportedVersion {
                found: raw.version,
                expected: FORMAT_VERSION,
            });
        }

        validate(Category::Positive, &raw.positive)?;
        validate(Category::Negative, &raw.negative)?;
        validate(Category::Ui, &raw.ui)?;

        let digest = hex::encode(Sha256::digest(yaml.as_bytes()));

        debug!(
            "Loaded fixture table v{} ({} positive, {} negative, {} ui, sha256 {})",
            raw.version,
            raw.positive.len(),
            raw.negative.len(),
            raw.ui.len(),
            &digest[..12]
        );

        Ok(Self {
            version: raw.version,
            positive: raw.positive,
            negative: raw.negative,
            ui: raw.ui,
            digest,
        })
    }

    /// Parse and validate a fixture table from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Hex SHA-256 of the source document
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Fixtures of one category, in table order
    pub fn category(&self, category: Category) -> &[Fixture] {
        match category {
            Category::Positive => &self.positive,
            Category::Negative => &self.negative,
            Category::Ui => &self.ui,
        }
    }

    /// All fixtures in execution order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Fixture)> + '_ {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.category(c).iter().map(move |f| (c, f)))
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len() + self.ui.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a fixture by id. Ids are only unique per category, so the first
    /// match in execution order wins.
    pub fn find(&self, id: &str) -> Option<(Category, &Fixture)> {
        self.iter().find(|(_, f)| f.id == id)
    }

    /// Fixtures matching `selection`, in execution order
    pub fn select<'a>(&'a self, selection: &'a Selection) -> impl Iterator<Item = (Category, &'a Fixture)> + 'a {
        self.iter().filter(move |(c, f)| selection.matches(*c, f))
    }
}

fn validate(category: Category, fixtures: &[Fixture]) -> Result<()> {
    let mut seen = HashSet::new();

    for fixture in fixtures {
        if !ID_PATTERN.is_match(&fixture.id) {
            return Err(FixtureError::InvalidId {
                category,
                id: fixture.id.clone(),
            });
        }
        if !seen.insert(fixture.id.as_str()) {
            return Err(FixtureError::DuplicateId {
                category,
                id: fixture.id.clone(),
            });
        }

        let fields = [
            ("name", &fixture.name),
            ("input", &fixture.input),
            ("expected", &fixture.expected),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(FixtureError::EmptyField {
                    id: fixture.id.clone(),
                    field,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(id: &str, input: &str, expected: &str) -> String {
        format!(
            r#"  - id: {id}
    name: case {id}
    inputLength: S
    input: "{input}"
    expected: "{expected}"
    type: Daily language usage
    grammar: Simple sentence
    quality: Accuracy validation
"#
        )
    }

    #[test]
    fn test_parse_minimal_table() {
        let yaml = format!(
            "version: 1\npositive:\n{}{}negative:\n{}",
            record("Pos_Fun_0001", "api yamu", "අපි යමු"),
            record("Pos_Fun_0002", "mama", "මම"),
            record("Neg_Fun_0001", "x", "x"),
        );
        let table = FixtureTable::from_yaml(&yaml).unwrap();
        assert_eq!(table.version(), 1);
        assert_eq!(table.len(), 3);
        assert!(table.category(Category::Ui).is_empty());

        let ids: Vec<_> = table.iter().map(|(_, f)| f.id.as_str()).collect();
        assert_eq!(ids, ["Pos_Fun_0001", "Pos_Fun_0002", "Neg_Fun_0001"]);
    }

    #[test]
    fn test_unsupported_version() {
        let yaml = format!("version: 2\npositive:\n{}", record("Pos_Fun_0001", "a", "b"));
        let err = FixtureTable::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, FixtureError::UnsupportedVersion { found: 2, expected: 1 }));
    }

    #[test]
    fn test_duplicate_id_within_category() {
        let yaml = format!(
            "version: 1\npositive:\n{}{}",
            record("Pos_Fun_0001", "a", "b"),
            record("Pos_Fun_0001", "c", "d"),
        );
        let err = FixtureTable::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, FixtureError::DuplicateId { category: Category::Positive, .. }));
    }

    #[test]
    fn test_same_id_in_different_categories() {
        let yaml = format!(
            "version: 1\npositive:\n{}ui:\n{}",
            record("Pos_Fun_0001", "a", "b"),
            record("Pos_Fun_0001", "c", "d"),
        );
        let table = FixtureTable::from_yaml(&yaml).unwrap();
        let (category, fixture) = table.find("Pos_Fun_0001").unwrap();
        assert_eq!(category, Category::Positive);
        assert_eq!(fixture.input, "a");
    }

    #[test]
    fn test_malformed_id() {
        let yaml = format!("version: 1\nnegative:\n{}", record("neg-1", "a", "b"));
        let err = FixtureTable::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidId { category: Category::Negative, .. }));
    }

    #[test]
    fn test_empty_expected() {
        let yaml = format!("version: 1\nui:\n{}", record("Pos_UI_0001", "a", ""));
        let err = FixtureTable::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, FixtureError::EmptyField { field: "expected", .. }));
    }

    #[test]
    fn test_strings_kept_verbatim() {
        let yaml = format!(
            "version: 1\npositive:\n{}",
            record("Pos_Fun_0001", "  two  spaces ", "චිත්\u{200d}රපටියක්"),
        );
        let table = FixtureTable::from_yaml(&yaml).unwrap();
        let fixture = &table.category(Category::Positive)[0];
        assert_eq!(fixture.input, "  two  spaces ");
        assert!(fixture.expected.contains('\u{200d}'));
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = format!("version: 1\npositive:\n{}", record("Pos_Fun_0001", "a", "b"));
        let b = format!("version: 1\npositive:\n{}", record("Pos_Fun_0001", "a", "c"));
        let ta = FixtureTable::from_yaml(&a).unwrap();
        let tb = FixtureTable::from_yaml(&b).unwrap();
        assert_eq!(ta.digest().len(), 64);
        assert_ne!(ta.digest(), tb.digest());
        assert_eq!(ta.digest(), FixtureTable::from_yaml(&a).unwrap().digest());
    }

    #[test]
    fn test_select_by_category_and_id() {
        let yaml = format!(
            "version: 1\npositive:\n{}{}negative:\n{}",
            record("Pos_Fun_0001", "a", "b"),
            record("Pos_Fun_0002", "c", "d"),
            record("Neg_Fun_0001", "e", "f"),
        );
        let table = FixtureTable::from_yaml(&yaml).unwrap();

        let negatives = Selection {
            categories: vec![Category::Negative],
            ..Default::default()
        };
        assert_eq!(table.select(&negatives).count(), 1);

        let by_id = Selection {
            ids: vec!["Pos_Fun_0002".into()],
            ..Default::default()
        };
        let picked: Vec<_> = table.select(&by_id).map(|(_, f)| f.id.clone()).collect();
        assert_eq!(picked, ["Pos_Fun_0002"]);

        assert_eq!(table.select(&Selection::all()).count(), 3);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "version: 1\nui:\n{}", record("Pos_UI_0001", "Api yamu", "අපි යමු")).unwrap();

        let table = FixtureTable::from_file(file.path()).unwrap();
        assert_eq!(table.category(Category::Ui).len(), 1);
    }
}
