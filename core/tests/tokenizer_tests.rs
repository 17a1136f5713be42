use beacon_core::tokenizer::{tokenize, tokenize_counted};

#[test]
fn it_normalizes_and_stems() {
    let words = tokenize("Running Runners RUN!");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC folds fullwidth forms and ligatures before tokenization
    assert_eq!(tokenize("ｆｏｘ ﬁle"), tokenize("fox file"));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

// Apostrophes split tokens, so contractions arrive as fragments; both
// halves must be filtered rather than leaking into the index.
#[test]
fn it_filters_contraction_fragments() {
    let words = tokenize("Don't stop: it's won't-territory, they've arrived");
    assert_eq!(words, vec!["stop", "territori", "arriv"]);
}

#[test]
fn it_preserves_source_order() {
    assert_eq!(tokenize("zebra apple mango"), vec!["zebra", "appl", "mango"]);
}

#[test]
fn splitting_on_punctuation_matches_whitespace() {
    assert_eq!(tokenize("wiki/page?q=1"), tokenize("wiki page q 1"));
}

// Re-tokenizing the joined output changes nothing: stems are already
// lowercase alphanumeric runs and stemming is idempotent on its own output.
#[test]
fn it_is_idempotent_over_its_own_output() {
    let texts = [
        "The quick brown fox jumps over the lazy dog",
        "Crawling, indexing & ranking: 3 subsystems!",
        "Zebras graze; herons wade.",
    ];
    for text in texts {
        let first = tokenize(text);
        let joined = first.join(" ");
        let (second, raw) = tokenize_counted(&joined);
        assert_eq!(second, first, "re-tokenizing changed: {text}");
        assert_eq!(raw, first.len());
    }
}
