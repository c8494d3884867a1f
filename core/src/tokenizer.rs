use regex::Regex;
use std::collections::HashSet;

/// English function words. `why`, `how` and `what` are left out here and only
/// appear in [`QUERY_STOPWORDS`].
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd","your","yours","yourself","yourselves",
    "he","him","his","himself","she","she's","her","hers","herself","it","it's","its","itself",
    "they","them","their","theirs","themselves","which","who","whom","this","that","that'll","these","those",
    "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
    "a","an","the","and","but","if","or","because","as","until","while","of","at","by","for","with","about","against",
    "between","into","through","during","before","after","above","below","to","from","up","down","in","out","on","off",
    "over","under","again","further","then","once","here","there","when","where","all","any","both","each","few",
    "more","most","other","some","such","no","nor","not","only","own","same","so","than","too","very",
    "s","t","can","will","just","don","don't","should","should've","now","d","ll","m","o","re","ve","y",
    "ain","aren","aren't","couldn","couldn't","didn","didn't","doesn","doesn't","hadn","hadn't","hasn","hasn't",
    "haven","haven't","isn","isn't","ma","mightn","mightn't","mustn","mustn't","needn","needn't","shan","shan't",
    "shouldn","shouldn't","wasn","wasn't","weren","weren't","won","won't","wouldn","wouldn't",
];

/// Words that are frequent in Wikipedia markup and carry no topic.
pub const CORPUS_STOPWORDS: &[&str] = &[
    "category", "references", "also", "external", "links", "may", "first", "see", "history", "people", "one",
    "two", "part", "thumb", "including", "second", "following", "many", "however", "would", "became",
];

/// Question and command words dropped only from free-text queries.
pub const QUERY_STOPWORDS: &[&str] = &["why", "how", "what", "make"];

const WORD_PATTERN: &str = r"[#@\w](['\-]?\w){2,24}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwordPolicy {
    /// English + corpus + query words. Used by the main search entry point.
    Strict,
    /// English + corpus words. Used by the per-field entry points.
    Base,
}

/// Lowercasing word extractor with stopword filtering.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    word: Regex,
    base: HashSet<&'static str>,
    strict: HashSet<&'static str>,
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new() }
}

impl Tokenizer {
    pub fn new() -> Self {
        let base: HashSet<&'static str> = ENGLISH_STOPWORDS.iter().chain(CORPUS_STOPWORDS).copied().collect();
        let strict = base.iter().chain(QUERY_STOPWORDS).copied().collect();
        Self { word: Regex::new(WORD_PATTERN).expect("valid regex"), base, strict }
    }

    /// All word matches of the lowercased text, before stopword removal.
    pub fn words(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.word.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
    }

    pub fn tokenize(&self, text: &str, policy: StopwordPolicy) -> Vec<String> {
        let stop = match policy {
            StopwordPolicy::Strict => &self.strict,
            StopwordPolicy::Base => &self.base,
        };
        self.words(text).into_iter().filter(|t| !stop.contains(t.as_str())).collect()
    }

    pub fn is_stopword(&self, token: &str, policy: StopwordPolicy) -> bool {
        match policy {
            StopwordPolicy::Strict => self.strict.contains(token),
            StopwordPolicy::Base => self.base.contains(token),
        }
    }
}
