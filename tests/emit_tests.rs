use std::fs;

use newsdigest_md::{emit_output, sha256_hex, slugify, write_atomic};
use tempfile::tempdir;

#[test]
fn slug_keeps_ascii_words() {
    assert_eq!(slugify("Kurznachrichten"), "kurznachrichten");
    assert_eq!(slugify("  Kurznachrichten   März 2025 "), "kurznachrichten_mrz_2025");
    assert_eq!(slugify(" !!! "), "output");
    assert_eq!(slugify(&"a".repeat(200)).len(), 80);
}

#[test]
fn outputs_are_numbered_and_never_overwritten() {
    let td = tempdir().unwrap();
    let outdir = td.path().join("out");
    let outdir = outdir.to_str().unwrap();

    let first = emit_output("erste\n", "Kurznachrichten", outdir).unwrap();
    let second = emit_output("zweite\n", "Kurznachrichten", outdir).unwrap();
    assert!(first.md_path.ends_with("kurznachrichten_1.md"));
    assert!(second.md_path.ends_with("kurznachrichten_2.md"));
    assert_eq!(fs::read_to_string(&first.md_path).unwrap(), "erste\n");
    assert_eq!(fs::read_to_string(&second.md_path).unwrap(), "zweite\n");
    assert_eq!(first.sha256, sha256_hex(b"erste\n"));
    assert_eq!(first.sha256.len(), 64);
}

#[test]
fn sha256_matches_known_digest() {
    assert_eq!(sha256_hex(b"abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}

#[test]
fn atomic_write_respects_overwrite_flag() {
    let td = tempdir().unwrap();
    let path = td.path().join("working.md");
    write_atomic(&path, "alt\n", true).unwrap();
    assert!(write_atomic(&path, "neu\n", false).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "alt\n");
    write_atomic(&path, "neu\n", true).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "neu\n");
}
