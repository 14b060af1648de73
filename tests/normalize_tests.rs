use newsdigest_md::normalize::{
    collapse_blank_after_text, collapse_blank_runs, inject_frontmatter, remove_placeholder_lines,
    space_comments, space_headings, strip_heading_date_suffix,
};
use newsdigest_md::{
    build_frontmatter, comment_categories, normalize, render_selection, ArticleParser, CategoryError,
    CategoryValidator, Config, Correction, Corrections, IssueDate, Normalizer,
};

fn date(year: u16, month: u8) -> IssueDate {
    IssueDate::new(year, month).expect("valid date")
}

#[test]
fn single_blank_after_text_disappears() {
    assert_eq!(collapse_blank_after_text("Text\n\nMehr\n"), "Text\nMehr\n");
    assert_eq!(collapse_blank_after_text("Text\n\n\nMehr\n"), "Text\n\nMehr\n");
    assert_eq!(collapse_blank_after_text("Text\n\n\n\nMehr"), "Text\n\n\nMehr");
}

#[test]
fn headings_get_surrounding_blank_lines() {
    assert_eq!(space_headings("Text\n###### Title\nBody"), "Text\n\n###### Title\n\nBody");
    assert_eq!(space_headings("Text\n\n###### Title\nBody"), "Text\n\n###### Title\n\nBody");
    // level seven is not a heading
    assert_eq!(space_headings("Text\n####### Nein\nBody"), "Text\n####### Nein\nBody");
}

#[test]
fn comments_get_surrounding_blank_lines() {
    assert_eq!(
        space_comments("Text\n<!--\ncategories: Politik\n-->\nBody\n"),
        "Text\n\n<!--\ncategories: Politik\n-->\n\nBody\n"
    );
    assert_eq!(space_comments("Text\n<!-- x -->\nBody"), "Text\n\n<!-- x -->\n\nBody");
    assert_eq!(space_comments("Text\n\n<!-- x -->\n\nBody"), "Text\n\n<!-- x -->\n\nBody");
}

#[test]
fn date_suffix_is_stripped_from_headings_only() {
    assert_eq!(strip_heading_date_suffix("###### Nachricht 3 (*Date*)\nText"), "###### Nachricht 3\nText");
    assert_eq!(strip_heading_date_suffix("######   Titel  (*DATE*)   \n\nBody"), "######   Titel\n\nBody");
    assert_eq!(strip_heading_date_suffix("Text (*Date*)\n"), "Text (*Date*)\n");
    assert_eq!(strip_heading_date_suffix("###### A (*Date*) B\n"), "###### A (*Date*) B\n");
}

#[test]
fn placeholder_lines_are_removed_whole() {
    assert_eq!(
        remove_placeholder_lines("Vor\n{{< my_link url=\"Link\" >}}\nNach\n", "my_link", "Link"),
        "Vor\nNach\n"
    );
    assert_eq!(
        remove_placeholder_lines("Vor\n   {{< my_link url=\"Link\" >}}   \nNach\n", "my_link", "Link"),
        "Vor\nNach\n"
    );
    let kept = "Siehe {{< my_link url=\"Link\" >}} hier\n{{< my_link url=\"https://example.org\" >}}\n";
    assert_eq!(remove_placeholder_lines(kept, "my_link", "Link"), kept);
}

#[test]
fn blank_runs_collapse_to_one() {
    assert_eq!(collapse_blank_runs("a\n\n\n\nb"), "a\n\nb");
    assert_eq!(collapse_blank_runs("a\n\nb"), "a\n\nb");
}

#[test]
fn frontmatter_aggregates_comments_and_replaces_existing() {
    let text = "---\ntitle: \"alt\"\n---\n\n###### A\n<!--\ncategories: Wirtschaft\ntags: Rat\n-->\nText\n\
###### B\n<!--\ncategories: Politik\ntags: Handel, Rat\norte: Bamberg\n-->\nText\n";
    let out = inject_frontmatter(text, "Kurznachrichten", date(2025, 3), &Corrections::default());
    assert!(out.starts_with("---\ntitle: \"Kurznachrichten\"\ndate: 2025-03-20T12:23:04+02:00\n"));
    assert!(out.contains("categories: [Politik, Wirtschaft]\ntags: [Handel, Rat]\norte: [Bamberg]\n"));
    assert!(out.contains("layout: card-columns\n---\n\n###### A\n"));
    assert!(!out.contains("alt"));
    assert_eq!(out.matches("title:").count(), 1);
}

const DIGEST: &str = "###### Rathaus (*Date*)
<!--
categories: Politk
tags: Rat
orte: Bamberg
-->
Erster Absatz.

Zweiter Absatz.
{{< my_link url=\"Link\" >}}
<!--split-->
###### Markt
<!--
categories: Wirtschaft
tags: Handel, Rat
-->
Text.
";

const EXPECTED: &str = "---
title: \"Kurznachrichten\"
date: 2025-11-20T12:23:04+02:00
series: [Blog, Kurznachrichten]
categories: [Politik, Wirtschaft]
tags: [Handel, Rat]
orte: [Bamberg]
media:
    path: \"http://kastl/blog-bf/news/2025/11/\"
layout: card-columns
---

###### Rathaus

<!--
categories: Politk
tags: Rat
orte: Bamberg
-->

Erster Absatz.
Zweiter Absatz.

<!--split-->

###### Markt

<!--
categories: Wirtschaft
tags: Handel, Rat
-->

Text.
";

#[test]
fn selection_normalizes_to_publishable_output() {
    let cfg = Config::default();
    let parser = ArticleParser::new(&cfg);
    let mut outcome = parser.parse(DIGEST).expect("parse");
    let corrections = CategoryValidator::new(&cfg).validate(&mut outcome.records).expect("correctable");
    assert_eq!(corrections.summary(), "Politk -> Politik");

    let selected: Vec<_> = outcome.records.iter().collect();
    let rendered = parser.render_selection(&selected, "Kurznachrichten", date(2025, 11)).expect("non-empty");
    let out = Normalizer::new(&cfg).with_corrections(corrections).normalize(&rendered, "Kurznachrichten", date(2025, 11));
    assert_eq!(out, EXPECTED);
}

#[test]
fn uncorrected_categories_stay_as_written_without_corrections() {
    let outcome = newsdigest_md::parse(DIGEST).expect("parse");
    let selected: Vec<_> = outcome.records.iter().collect();
    let rendered = render_selection(&selected, "Kurznachrichten", date(2025, 11)).expect("non-empty");
    let out = normalize(&rendered, "Kurznachrichten", date(2025, 11));
    assert!(out.contains("categories: [Politk, Wirtschaft]\n"));
}

#[test]
fn normalizing_twice_changes_nothing() {
    let inputs = [
        EXPECTED,
        "Text\n###### T\nBody\nMore\n",
        "###### A (*Date*)\n<!-- categories: Politik -->\nEins.\nZwei.\n{{< my_link url=\"Link\" >}}\n",
        "",
    ];
    for input in inputs {
        let once = normalize(input, "Kurznachrichten", date(2025, 10));
        let twice = normalize(&once, "Kurznachrichten", date(2025, 10));
        assert_eq!(once, twice, "input: {:?}", input);
    }
}

#[test]
fn paragraph_gap_is_treated_the_same_regardless_of_surroundings() {
    let header = build_frontmatter("Kurznachrichten", date(2025, 10), &[] as &[&str], &[], &[]);
    let tidy = format!("{}\n###### B\n\nPara1\n\nPara2\n", header);
    let untidy = "###### A\nText A\n\n###### B\n\nPara1\n\nPara2\n";
    for input in [tidy.as_str(), untidy] {
        let out = normalize(input, "Kurznachrichten", date(2025, 10));
        assert!(out.ends_with("###### B\n\nPara1\nPara2\n"), "output: {:?}", out);
    }
}

#[test]
fn emitted_file_keeps_corrected_categories_when_normalized_again() {
    assert_eq!(comment_categories(EXPECTED), vec!["Politk", "Wirtschaft"]);
    let normalizer = Normalizer::for_text(&Config::default(), EXPECTED).expect("correctable");
    assert_eq!(normalizer.normalize(EXPECTED, "Kurznachrichten", date(2025, 11)), EXPECTED);
}

#[test]
fn emitted_file_with_unknown_category_is_refused() {
    let text = "###### A\n\n<!-- categories: Sport -->\n\nText.\n";
    let err = Normalizer::for_text(&Config::default(), text).unwrap_err();
    assert_eq!(err, CategoryError::Unrecognized { value: "Sport".to_string() });
}

#[test]
fn explicit_corrections_reach_the_frontmatter() {
    let corrections = Corrections(vec![Correction { original: "Politk".into(), corrected: "Politik".into() }]);
    let normalizer = Normalizer::new(&Config::default()).with_corrections(corrections);
    assert_eq!(normalizer.normalize(EXPECTED, "Kurznachrichten", date(2025, 11)), EXPECTED);
}

#[test]
fn crlf_input_normalizes_like_lf_input() {
    let lf = "Text\n###### T (*Date*)\nBody\n\n\n\nMehr\n<!-- categories: Politik -->\nEnde\n";
    let crlf = lf.replace('\n', "\r\n");
    let out = normalize(&crlf, "Kurznachrichten", date(2025, 10));
    assert!(!out.contains('\r'));
    assert_eq!(out, normalize(lf, "Kurznachrichten", date(2025, 10)));
}
