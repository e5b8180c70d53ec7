//! Keyword frequency over task descriptions.

use std::collections::BTreeMap;

use super::types::KeywordCount;

/// Tokens with this many characters or fewer are ignored.
pub const MAX_IGNORED_TOKEN_CHARS: usize = 3;

/// Default number of keywords kept in a report.
pub const DEFAULT_TOP_KEYWORDS: usize = 10;

/// Lowercased token → occurrence count.
pub type KeywordFrequency = BTreeMap<String, u32>;

/// Count keywords across every description.
///
/// Descriptions are split on whitespace and lowercased; tokens of
/// [`MAX_IGNORED_TOKEN_CHARS`] characters or fewer are dropped.
pub fn extract_keywords<'a, I>(descriptions: I) -> KeywordFrequency
where
    I: IntoIterator<Item = &'a str>,
{
    let mut frequency = KeywordFrequency::new();
    for description in descriptions {
        for token in description.split_whitespace() {
            let word = token.to_lowercase();
            if word.chars().count() > MAX_IGNORED_TOKEN_CHARS {
                *frequency.entry(word).or_insert(0) += 1;
            }
        }
    }
    frequency
}

/// The `limit` most frequent keywords, highest count first.
///
/// The sort is stable over the map's iteration order, so ties come out
/// alphabetically. Callers should not depend on the order within a tie.
pub fn top_keywords(frequency: &KeywordFrequency, limit: usize) -> Vec<KeywordCount> {
    let mut ranked: Vec<(&String, &u32)> = frequency.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, count)| KeywordCount {
            word: word.clone(),
            count: *count,
        })
        .collect()
}
