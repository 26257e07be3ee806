// Part-of-speech tagging and the POS weight prior.
//
// The tagger is a collaborator; `LexiconTagger` is a small rule-based
// implementation (closed-class word lists plus suffix rules) that is good
// enough to separate content words from function words.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Conjunction,
    Preposition,
    Number,
    Other,
}

impl PosTag {
    pub fn is_content(self) -> bool {
        matches!(self, PosTag::Noun | PosTag::Verb)
    }
}

/// Nouns and verbs weigh 2.0, everything else 1.0, independent of frequency.
pub fn pos_weight(tag: PosTag) -> f64 {
    if tag.is_content() {
        2.0
    } else {
        1.0
    }
}

/// Trait for taggers. Must return exactly one tag per token.
pub trait PosTagger: Send + Sync {
    fn tag(&self, tokens: &[String]) -> Vec<PosTag>;
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "some", "any", "every", "each", "no",
];
const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your",
    "his", "its", "our", "their", "who", "whom", "which",
];
const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "so", "yet", "nor", "because", "although", "though", "while", "whereas",
    "however",
];
const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "of", "to", "for", "with", "by", "from", "about", "into", "over", "after",
    "before", "under", "between", "against", "during", "without", "through",
];
const VERBS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does", "did",
    "will", "would", "can", "could", "should", "may", "might", "must", "said", "says", "say",
    "told", "made", "make", "went", "go", "goes", "took", "take", "rose", "fell", "hit", "won",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconTagger;

impl LexiconTagger {
    fn tag_one(token: &str) -> PosTag {
        if token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
            return PosTag::Number;
        }
        if DETERMINERS.contains(&token) {
            return PosTag::Determiner;
        }
        if PRONOUNS.contains(&token) {
            return PosTag::Pronoun;
        }
        if CONJUNCTIONS.contains(&token) {
            return PosTag::Conjunction;
        }
        if PREPOSITIONS.contains(&token) {
            return PosTag::Preposition;
        }
        if VERBS.contains(&token) {
            return PosTag::Verb;
        }
        if token.len() > 4 && token.ends_with("ly") {
            return PosTag::Adverb;
        }
        if token.len() > 4 && (token.ends_with("ing") || token.ends_with("ed")) {
            return PosTag::Verb;
        }
        if token.len() > 5
            && ["ous", "ful", "ive", "able", "ible", "al", "ic"]
                .iter()
                .any(|s| token.ends_with(s))
        {
            return PosTag::Adjective;
        }
        if token.chars().any(char::is_alphabetic) {
            PosTag::Noun
        } else {
            PosTag::Other
        }
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, tokens: &[String]) -> Vec<PosTag> {
        tokens
            .iter()
            .map(|t| Self::tag_one(&t.to_lowercase()))
            .collect()
    }
}
