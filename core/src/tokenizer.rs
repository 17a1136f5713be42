use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid token pattern");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    // Contractions are listed as the fragments the token rule produces
    // ("don't" splits into "don" + "t"), so both halves are filtered.
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","couldn",
            "d","did","didn","do","does","doesn","doing","don","down","during",
            "each","few","for","from","further",
            "had","hadn","has","hasn","have","haven","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","it","its","itself",
            "let","ll","m","me","more","most","mustn","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "re","s","same","she","should","shouldn","so","some","such",
            "t","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","we","were","weren","what","when","where","which","while","who","whom","why","with","won","would","wouldn",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Tokenize text into ordered stems: NFKC normalization, lowercase, maximal
/// runs of letters/digits, stopword removal, then stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_counted(text).0
}

/// Like [`tokenize`], but also reports how many tokens the text contained
/// before the stopword filter. The ratio of the two feeds the document's
/// retained-fraction length factor.
pub fn tokenize_counted(text: &str) -> (Vec<String>, usize) {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut stems = Vec::new();
    let mut raw = 0usize;
    for mat in TOKEN.find_iter(&normalized) {
        raw += 1;
        let token = mat.as_str();
        if is_stopword(token) {
            continue;
        }
        stems.push(STEMMER.stem(token).to_string());
    }
    (stems, raw)
}
