use newsdigest_md::{extract_article, parse_metadata_comment, ExtractError};

#[test]
fn reads_all_three_lists_and_skips_unknown_keys() {
    let meta = parse_metadata_comment(
        "\ncategories: Politik, Wirtschaft\ntags: [Rat, Haushalt]\norte: Bamberg, Hallstadt\nautor: jemand\n",
    );
    assert_eq!(meta.categories, vec!["Politik", "Wirtschaft"]);
    assert_eq!(meta.tags, vec!["Rat", "Haushalt"]);
    assert_eq!(meta.locations, vec!["Bamberg", "Hallstadt"]);
}

#[test]
fn locations_are_only_read_from_their_own_line() {
    let meta = parse_metadata_comment("tags: Rat, orte: Bamberg");
    assert_eq!(meta.tags, vec!["Rat", "orte: Bamberg"]);
    assert!(meta.locations.is_empty());
}

#[test]
fn repeated_keys_append_and_empty_values_vanish() {
    let meta = parse_metadata_comment("tags: A\nTAGS: B, , \ncategories: , ,");
    assert_eq!(meta.tags, vec!["A", "B"]);
    assert!(meta.categories.is_empty());
}

#[test]
fn duplicates_are_kept_as_authored() {
    let meta = parse_metadata_comment("tags: Rat, Rat");
    assert_eq!(meta.tags, vec!["Rat", "Rat"]);
}

#[test]
fn extract_uses_first_comment_only() {
    let block = "###### Titel\n<!-- categories: Politik -->\nText <!-- categories: Wirtschaft -->";
    let rec = extract_article(block, 7).expect("has title");
    assert_eq!(rec.title, "Titel");
    assert_eq!(rec.position, 7);
    assert_eq!(rec.categories, vec!["Politik"]);
    assert_eq!(rec.raw, format!("{}\n", block));
}

#[test]
fn extract_without_heading_fails() {
    assert_eq!(extract_article("Kein Titel hier", 4).unwrap_err(), ExtractError::MissingTitle(4));
}
