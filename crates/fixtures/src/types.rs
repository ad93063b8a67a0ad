//! Fixture record types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative size of a fixture's input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputLength {
    /// Short: a phrase or a single sentence
    S,
    /// Medium: a long sentence or a pair of clauses
    M,
    /// Long: a paragraph
    L,
}

impl InputLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputLength::S => "S",
            InputLength::M => "M",
            InputLength::L => "L",
        }
    }
}

impl fmt::Display for InputLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixture category. Categories execute in the order of [`Category::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Positive,
    Negative,
    Ui,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Positive, Category::Negative, Category::Ui];

    /// Key used in the fixture file and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Positive => "positive",
            Category::Negative => "negative",
            Category::Ui => "ui",
        }
    }

    /// Group title used when reporting
    pub fn title(&self) -> &'static str {
        match self {
            Category::Positive => "Positive Functional Tests",
            Category::Negative => "Negative Functional Tests",
            Category::Ui => "UI Functionality Tests",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" | "pos" => Ok(Category::Positive),
            "negative" | "neg" => Ok(Category::Negative),
            "ui" => Ok(Category::Ui),
            other => Err(format!("unknown fixture category: {}", other)),
        }
    }
}

/// One literal input/expected-output pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Fixture {
    /// Identifier, unique within its category (e.g. `Pos_Fun_0001`)
    pub id: String,

    /// Short description of what the case covers
    pub name: String,

    pub input_length: InputLength,

    /// Singlish text typed into the input field
    pub input: String,

    /// Exact text the output region must contain after trimming
    pub expected: String,

    /// Input classification (e.g. "Mixed Singlish + English")
    #[serde(rename = "type")]
    pub kind: String,

    pub grammar: String,

    /// Quality attribute the case validates
    pub quality: String,
}

impl Fixture {
    /// Case label used in logs and reports: `"{id} - {name}"`
    pub fn title(&self) -> String {
        format!("{} - {}", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("positive", Category::Positive)]
    #[test_case("NEG", Category::Negative)]
    #[test_case("ui", Category::Ui)]
    fn test_category_from_str(input: &str, expected: Category) {
        assert_eq!(input.parse::<Category>().unwrap(), expected);
    }

    #[test]
    fn test_category_from_str_rejects_unknown() {
        assert!("smoke".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_order() {
        let mut sorted = vec![Category::Ui, Category::Positive, Category::Negative];
        sorted.sort();
        assert_eq!(sorted, Category::ALL.to_vec());
    }

    #[test]
    fn test_fixture_field_names() {
        let yaml = r#"
id: Pos_Fun_0001
name: Simple greeting conversion
inputLength: S
input: oyaata suba dhavasak
expected: ඔයාට සුබ දවසක්
type: Greeting / request / response
grammar: Simple sentence
quality: Accuracy validation
"#;
        let fixture: Fixture = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fixture.input_length, InputLength::S);
        assert_eq!(fixture.kind, "Greeting / request / response");
        assert_eq!(fixture.title(), "Pos_Fun_0001 - Simple greeting conversion");
    }

    #[test]
    fn test_fixture_rejects_unknown_fields() {
        let yaml = r#"
id: Pos_Fun_0001
name: n
inputLength: S
input: a
expected: b
type: t
grammar: g
quality: q
severity: high
"#;
        assert!(serde_yaml::from_str::<Fixture>(yaml).is_err());
    }
}
