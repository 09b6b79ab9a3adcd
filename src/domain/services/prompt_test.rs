use super::truncate_chars;
use super::with_document;
use super::with_instruction;
use super::FORMAT_INSTRUCTION;
use super::MAX_DOCUMENT_CHARS;

#[test]
fn it_truncates_by_chars() {
    assert_eq!(truncate_chars("abcdef", 3), "abc");
    assert_eq!(truncate_chars("abc", 3), "abc");
    assert_eq!(truncate_chars("ab", 3), "ab");
    assert_eq!(truncate_chars("", 3), "");
    assert_eq!(truncate_chars("éàü€x", 4), "éàü€");
}

#[test]
fn it_leaves_text_without_document() {
    assert_eq!(with_document("Hello", None), "Hello");
    assert_eq!(with_document("Hello", Some("")), "Hello");
}

#[test]
fn it_appends_document_section() {
    let res = with_document("Summarise this", Some("Chapter 1\nChapter 2"));

    insta::assert_snapshot!(res, @r###"
    Summarise this

    File content (excerpt):
    Chapter 1
    Chapter 2
    "###);
}

#[test]
fn it_appends_document_to_blank_text() {
    let res = with_document("", Some("[extraction error: broken]"));
    assert_eq!(res, "\n\nFile content (excerpt):\n[extraction error: broken]");
}

#[test]
fn it_caps_document_at_max_chars() {
    let document = "é".repeat(MAX_DOCUMENT_CHARS + 500);
    let res = with_document("Q", Some(&document));

    let excerpt = res.split('\n').last().unwrap();
    assert_eq!(excerpt.chars().count(), MAX_DOCUMENT_CHARS);
    assert!(res.starts_with("Q\n\nFile content (excerpt):\n"));
}

#[test]
fn it_keeps_documents_at_the_cap() {
    let document = "x".repeat(MAX_DOCUMENT_CHARS);
    let res = with_document("Q", Some(&document));
    assert!(res.ends_with(&document));
}

#[test]
fn it_prepends_instruction() {
    let res = with_instruction("What is the EOQ formula?");

    assert!(res.starts_with(FORMAT_INSTRUCTION));
    assert!(res.ends_with("\n\nWhat is the EOQ formula?"));
    assert!(FORMAT_INSTRUCTION.contains("$$ ... $$"));
}
