/// Case-insensitive keyword containment.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// (original keyword, case-folded keyword)
    keywords: Vec<(String, String)>,
}

impl KeywordMatcher {
    /// Creates a matcher for the given keywords. Repeated keywords are kept once,
    /// at their first position.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut folded: Vec<(String, String)> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if folded.iter().any(|(k, _)| *k == keyword) {
                continue;
            }
            let lower = keyword.to_lowercase();
            folded.push((keyword, lower));
        }
        Self { keywords: folded }
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Returns the keywords contained in `content`, in keyword order.
    ///
    /// The content is case-folded once; each keyword is then a plain substring
    /// test, so "cat" matches "concatenate".
    pub fn find_keywords(&self, content: &str) -> Vec<&str> {
        let folded = content.to_lowercase();
        self.keywords
            .iter()
            .filter(|(_, lower)| folded.contains(lower.as_str()))
            .map(|(keyword, _)| keyword.as_str())
            .collect()
    }
}
