//! Checks on the fixture table shipped with the crate

use std::path::PathBuf;

use swiftcheck_fixtures::{Category, FixtureTable, InputLength};
use test_case::test_case;

fn bundled() -> FixtureTable {
    FixtureTable::bundled().expect("bundled fixture table is valid")
}

#[test]
fn bundled_table_category_sizes() {
    let table = bundled();
    assert_eq!(table.category(Category::Positive).len(), 25);
    assert_eq!(table.category(Category::Negative).len(), 11);
    assert_eq!(table.category(Category::Ui).len(), 1);
    assert_eq!(table.len(), 37);
}

#[test]
fn bundled_table_matches_data_file() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/translations.yaml");
    let from_disk = FixtureTable::from_file(&path).unwrap();
    assert_eq!(from_disk.digest(), bundled().digest());
}

#[test]
fn execution_order_follows_table_order() {
    let table = bundled();
    let ids: Vec<_> = table.iter().map(|(_, f)| f.id.clone()).collect();

    assert_eq!(ids.first().map(String::as_str), Some("Pos_Fun_0001"));
    assert_eq!(ids[24], "Pos_Fun_0025");
    assert_eq!(ids[25], "Neg_Fun_0001");
    assert_eq!(ids.last().map(String::as_str), Some("Pos_UI_0001"));
}

#[test_case(Category::Positive, "Pos_Fun_0001", "oyaata suba dhavasak", "ඔයාට සුබ දවසක්")]
#[test_case(Category::Ui, "Pos_UI_0001", "Api yamu", "අපි යමු")]
#[test_case(Category::Negative, "Neg_Fun_0011", "apiadhabadmintonplaykaramudha", "අපිඅදbadmintonplayකරමුද")]
fn documented_scenarios_present(category: Category, id: &str, input: &str, expected: &str) {
    let table = bundled();
    let fixture = table
        .category(category)
        .iter()
        .find(|f| f.id == id)
        .unwrap_or_else(|| panic!("{id} missing from {category} fixtures"));

    assert_eq!(fixture.input, input);
    assert_eq!(fixture.expected, expected);
}

#[test]
fn literal_whitespace_and_joiners_preserved() {
    let table = bundled();

    let (_, double_space) = table.find("Pos_Fun_0003").unwrap();
    assert!(double_space.input.contains("10pm  venakan"));
    assert!(double_space.expected.contains("10pm  වෙනකන්"));

    let (_, joiner) = table.find("Pos_Fun_0012").unwrap();
    assert!(joiner.expected.contains("චිත්\u{200d}රපටියක්"));

    let (_, paragraph) = table.find("Pos_Fun_0025").unwrap();
    assert_eq!(paragraph.input_length, InputLength::L);
}

#[test]
fn no_fixture_has_surrounding_whitespace_in_expected() {
    // The extracted output is trimmed before comparison, so an expected value
    // with edge whitespace could never match.
    for (category, fixture) in bundled().iter() {
        assert_eq!(
            fixture.expected.trim(),
            fixture.expected,
            "{} fixture {} has edge whitespace",
            category,
            fixture.id
        );
    }
}
