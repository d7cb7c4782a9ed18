// orchestrator-service-rs/src/terms.rs
// Word-level keyword matching over a question

/// Shortest keyword that may match as a plain token prefix.
const PREFIX_STEM_LEN: usize = 6;

/// Endings a short keyword may carry, after an optional doubled final
/// consonant (`log` → `logged`, `logging`).
const INFLECTIONS: &[&str] = &["", "s", "es", "d", "ed", "ing", "er", "ers", "est", "ly", "ure", "ures"];

/// Lowercased word tokens of a question.
///
/// A keyword of six or more letters matches any token it prefixes
/// (`restart` matches `restarting`). Shorter keywords match the whole token
/// or a regular inflection of it, so `log` matches `logs` but not `login`,
/// and `down` does not match `download`. A phrase matches a run of
/// consecutive tokens equal to its words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terms {
    tokens: Vec<String>,
}

impl Terms {
    pub fn new(text: &str) -> Self {
        let tokens = text
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn matches(&self, keyword: &str) -> bool {
        let words: Vec<&str> = keyword.split_whitespace().collect();
        match words.as_slice() {
            [] => false,
            [word] => self.tokens.iter().any(|t| word_matches(t, word)),
            phrase => self
                .tokens
                .windows(phrase.len())
                .any(|run| run.iter().zip(phrase).all(|(t, w)| t == w)),
        }
    }

    pub fn any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.matches(k))
    }

    /// Whole-token match, for short terms like `1m` that would otherwise
    /// prefix unrelated words.
    pub fn exact(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t == word)
    }
}

fn word_matches(token: &str, keyword: &str) -> bool {
    let Some(rest) = token.strip_prefix(keyword) else {
        return false;
    };
    if keyword.len() >= PREFIX_STEM_LEN || INFLECTIONS.contains(&rest) {
        return true;
    }
    match keyword.chars().last() {
        Some(last) if !"aeiou".contains(last) => rest
            .strip_prefix(last)
            .map_or(false, |ending| !ending.is_empty() && INFLECTIONS.contains(&ending)),
        _ => false,
    }
}
