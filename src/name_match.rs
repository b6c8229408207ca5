//! Team-name resolution between the historical dataset and the quote feed.
//!
//! The two sources spell clubs independently ("Man United" vs "Manchester United FC"), so a
//! historical name is resolved through an ordered list of strategies. The first strategy
//! that accepts at least one feed key wins. When a strategy accepts several keys, the
//! strongest containment is taken first (literal, then abbreviation expanded, then word
//! prefix), then the shortest key, then the lexicographically smallest, so the outcome never
//! depends on map iteration order.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    Exact,
    HistoricalInFeedKey,
    FeedKeyInHistorical,
}

impl MatchRule {
    pub fn label(self) -> &'static str {
        match self {
            MatchRule::Exact => "exact",
            MatchRule::HistoricalInFeedKey => "historical-in-feed",
            MatchRule::FeedKeyInHistorical => "feed-in-historical",
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How one name was found inside another. Ordered strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Containment {
    /// Plain substring.
    Literal,
    /// Equal word sequence once known abbreviations are expanded ("Nott'm" -> "nottingham").
    Expanded,
    /// Every word prefixes a consecutive word of the longer name.
    WordPrefix,
}

pub trait NameMatcher: Send + Sync {
    fn rule(&self) -> MatchRule;

    /// `None` when `feed_key` is not a candidate for `historical`.
    fn containment(&self, historical: &str, feed_key: &str) -> Option<Containment>;

    fn accepts(&self, historical: &str, feed_key: &str) -> bool {
        self.containment(historical, feed_key).is_some()
    }
}

pub struct ExactMatcher;

impl NameMatcher for ExactMatcher {
    fn rule(&self) -> MatchRule {
        MatchRule::Exact
    }

    fn containment(&self, historical: &str, feed_key: &str) -> Option<Containment> {
        (historical == feed_key).then_some(Containment::Literal)
    }
}

/// The historical name appears inside the feed key ("Inter" in "Inter Milan").
pub struct HistoricalInFeedKey;

impl NameMatcher for HistoricalInFeedKey {
    fn rule(&self) -> MatchRule {
        MatchRule::HistoricalInFeedKey
    }

    fn containment(&self, historical: &str, feed_key: &str) -> Option<Containment> {
        name_containment(feed_key, historical)
    }
}

/// The feed key appears inside the historical name ("Betis" in "Real Betis Balompie").
pub struct FeedKeyInHistorical;

impl NameMatcher for FeedKeyInHistorical {
    fn rule(&self) -> MatchRule {
        MatchRule::FeedKeyInHistorical
    }

    fn containment(&self, historical: &str, feed_key: &str) -> Option<Containment> {
        name_containment(historical, feed_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameResolution<'k> {
    pub feed_key: &'k str,
    pub rule: MatchRule,
}

pub struct MatcherChain {
    matchers: Vec<Box<dyn NameMatcher>>,
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl MatcherChain {
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ExactMatcher),
            Box::new(HistoricalInFeedKey),
            Box::new(FeedKeyInHistorical),
        ])
    }

    pub fn new(matchers: Vec<Box<dyn NameMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn rules(&self) -> Vec<MatchRule> {
        self.matchers.iter().map(|m| m.rule()).collect()
    }

    pub fn resolve<'k, I>(&self, historical: &str, feed_keys: I) -> Option<NameResolution<'k>>
    where
        I: IntoIterator<Item = &'k str>,
    {
        if historical.trim().is_empty() {
            return None;
        }
        let keys: Vec<&'k str> = feed_keys
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect();

        for matcher in &self.matchers {
            let picked = keys
                .iter()
                .copied()
                .filter_map(|key| matcher.containment(historical, key).map(|c| (c, key)))
                .min_by(|(ca, a), (cb, b)| {
                    ca.cmp(cb)
                        .then_with(|| a.len().cmp(&b.len()))
                        .then_with(|| a.cmp(b))
                });
            if let Some((_, feed_key)) = picked {
                return Some(NameResolution {
                    feed_key,
                    rule: matcher.rule(),
                });
            }
        }
        None
    }
}

// Short forms used by results files, expanded to the words feeds spell out.
const ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("man", &["manchester"]),
    ("utd", &["united"]),
    ("nottm", &["nottingham"]),
    ("sheff", &["sheffield"]),
    ("wolves", &["wolverhampton", "wanderers"]),
    ("spurs", &["tottenham", "hotspur"]),
    ("qpr", &["queens", "park", "rangers"]),
    ("brom", &["bromwich"]),
    ("ath", &["athletic"]),
    ("ein", &["eintracht"]),
    ("mgladbach", &["monchengladbach"]),
    ("sp", &["sporting"]),
];

/// Whether `needle` is found inside `haystack`, literally or through word normalisation.
pub fn contains_name(haystack: &str, needle: &str) -> bool {
    name_containment(haystack, needle).is_some()
}

pub fn name_containment(haystack: &str, needle: &str) -> Option<Containment> {
    if needle.trim().is_empty() {
        return None;
    }
    if haystack.contains(needle) {
        return Some(Containment::Literal);
    }
    let hay_words = expanded_words(haystack);
    let needle_words = expanded_words(needle);
    if needle_words.is_empty() || needle_words.len() > hay_words.len() {
        return None;
    }
    let mut windows = hay_words.windows(needle_words.len());
    if windows.clone().any(|window| window == needle_words.as_slice()) {
        return Some(Containment::Expanded);
    }
    windows
        .any(|window| {
            window
                .iter()
                .zip(&needle_words)
                .all(|(hay, short)| hay.starts_with(short.as_str()))
        })
        .then_some(Containment::WordPrefix)
}

fn expanded_words(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in name_words(name) {
        match ABBREVIATIONS.iter().find(|(short, _)| *short == word) {
            Some((_, full)) => out.extend(full.iter().map(|w| w.to_string())),
            None => out.push(word),
        }
    }
    out
}

// Apostrophes are dropped so "Nott'm" stays one word; other punctuation separates words.
fn name_words(name: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().map(str::to_string).collect()
}
