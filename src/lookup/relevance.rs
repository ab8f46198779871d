//! Keyword relevance classifier for security news.

use regex::Regex;

/// Outcome of classifying a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relevance {
    pub relevant: bool,
    /// Primary keywords first, then secondary ones, in list order.
    pub matched: Vec<String>,
}

/// Decides whether a news entry is in-domain.
pub trait RelevanceClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Relevance;
}

pub const PRIMARY_KEYWORDS: &[&str] = &[
    "ransomware", "malware", "exploit", "vulnerability", "breach", "zero-day", "attack",
    "compromised", "infected", "stolen", "hacked", "leak", "backdoor", "trojan", "rootkit",
    "spyware", "security", "cyber",
];

pub const SECONDARY_KEYWORDS: &[&str] = &[
    "cybercrime", "phishing", "ddos", "apt", "hacking", "credential", "cyberattack",
    "databreach", "hack", "payload", "threat", "botnet", "mitigation", "critical",
    "authentication", "attacker", "command and control", "lateral movement", "exfiltration",
    "intrusion", "security flaw",
];

/// Marketing and event terms that veto an otherwise relevant entry.
pub const EXCLUDE_TERMS: &[&str] = &[
    "webinar", "workshop", "training", "course", "certification", "conference", "roundtable",
    "partner", "sponsored", "promotion", "discount", "offer", "register now", "sign up", "earn",
    "sale", "subscription", "tutorial", "guide", "how to", "introduction to",
];

struct Keyword {
    word: String,
    pattern: Regex,
}

impl Keyword {
    fn compile(words: &[&str]) -> Vec<Keyword> {
        words
            .iter()
            .filter_map(|word| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
                match Regex::new(&pattern) {
                    Ok(pattern) => Some(Keyword {
                        word: (*word).to_string(),
                        pattern,
                    }),
                    Err(e) => {
                        log::warn!("Skipping keyword '{}': {}", word, e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Whole-word, case-insensitive keyword policy.
///
/// Any exclusion term rejects the text outright. Otherwise at least one
/// primary keyword must appear; secondary keywords only add to the match list.
pub struct KeywordClassifier {
    primary: Vec<Keyword>,
    secondary: Vec<Keyword>,
    exclude: Vec<Keyword>,
}

impl KeywordClassifier {
    pub fn new(primary: &[&str], secondary: &[&str], exclude: &[&str]) -> Self {
        Self {
            primary: Keyword::compile(primary),
            secondary: Keyword::compile(secondary),
            exclude: Keyword::compile(exclude),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(PRIMARY_KEYWORDS, SECONDARY_KEYWORDS, EXCLUDE_TERMS)
    }
}

impl RelevanceClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Relevance {
        if self.exclude.iter().any(|k| k.pattern.is_match(text)) {
            return Relevance::default();
        }
        let mut matched: Vec<String> = self
            .primary
            .iter()
            .filter(|k| k.pattern.is_match(text))
            .map(|k| k.word.clone())
            .collect();
        if matched.is_empty() {
            return Relevance::default();
        }
        matched.extend(
            self.secondary
                .iter()
                .filter(|k| k.pattern.is_match(text))
                .map(|k| k.word.clone()),
        );
        Relevance {
            relevant: true,
            matched,
        }
    }
}
