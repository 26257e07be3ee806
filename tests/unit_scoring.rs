// Unit tests for the scorer layer and output helpers.
//
// Tests isolated pure functions: penalty bands and numeric safety, the
// per-cell sentence scorer chain, label self-exclusion for terms, the POS
// prior, n-gram typicality and truncate_chars UTF-8 safety.

use std::sync::Arc;

use facetmap::output::truncate_chars;
use facetmap::scoring::ngram::{BigramModel, NgramModel};
use facetmap::scoring::pos::{pos_weight, LexiconTagger, PosTag, PosTagger};
use facetmap::scoring::sentence::{SentenceScorer, SentenceScorers};
use facetmap::scoring::token::TokenScorer;
use facetmap::scoring::traits::{Candidate, Scorer};
use facetmap::scoring::{is_discarded, sanitize, DISCARD, MAJOR_PENALTY, MINOR_PENALTY};
use facetmap::text;
use facetmap::SummarizerConfig;

fn chain_score(scorers: &SentenceScorers, sentence: &str) -> f64 {
    let tokens = text::tokenize(sentence);
    let tags = LexiconTagger.tag(&tokens);
    scorers.score(&Candidate {
        text: sentence,
        tokens: &tokens,
        tags: &tags,
    })
}

fn default_chain(labels: &[&str]) -> SentenceScorers {
    SentenceScorers::for_cell(&SummarizerConfig::default(), labels, None)
}

// ============================================================
// Penalty bands and numeric safety
// ============================================================

#[test]
fn major_is_twice_minor() {
    assert_eq!(MINOR_PENALTY, -0.5);
    assert_eq!(MAJOR_PENALTY, 2.0 * MINOR_PENALTY);
}

#[test]
fn discard_is_finite_and_survives_accumulation() {
    assert!(DISCARD.is_finite());
    let many = (0..1000).fold(0.0, |acc, _| acc + DISCARD);
    assert!(many.is_finite());
    assert!(is_discarded(DISCARD + 10_000.0));
    assert!(!is_discarded(MAJOR_PENALTY * 10.0));
}

#[test]
fn discard_serializes_as_a_json_number() {
    let json = serde_json::to_string(&DISCARD).unwrap();
    assert_ne!(json, "null");
}

#[test]
fn sanitize_removes_non_finite_values() {
    assert_eq!(sanitize(f64::NAN), 0.0);
    assert!(sanitize(f64::INFINITY).is_finite());
    assert!(sanitize(f64::NEG_INFINITY).is_finite());
    assert_eq!(sanitize(-3.25), -3.25);
}

// ============================================================
// Sentence scorer chain
// ============================================================

#[test]
fn clean_long_sentence_is_neutral() {
    let scorers = default_chain(&["DE", "covid"]);
    let score = chain_score(&scorers, "Hospitals across Bavaria postponed routine surgery.");
    assert_eq!(score, 0.0);
}

#[test]
fn short_sentence_gets_major_penalty() {
    let scorers = default_chain(&["DE", "covid"]);
    // 29 characters, default minimum is 30
    let score = chain_score(&scorers, "Covid wards filled in Berlin.");
    assert_eq!(score, MAJOR_PENALTY);
}

#[test]
fn stylistic_signals_accumulate() {
    let scorers = default_chain(&[]);
    let score = chain_score(
        &scorers,
        "But they said the regional hospitals were already full.",
    );
    // leading conjunction + reporting verb
    assert_eq!(score, 2.0 * MINOR_PENALTY);
}

#[test]
fn quoted_sentence_is_discarded() {
    let scorers = default_chain(&[]);
    let score = chain_score(
        &scorers,
        "\"We are overwhelmed,\" a nurse at the Charite clinic told reporters.",
    );
    assert!(is_discarded(score));
    assert!(score.is_finite());
}

#[test]
fn label_only_sentence_is_discarded() {
    let scorers = default_chain(&["New York", "covid"]);
    assert!(is_discarded(chain_score(&scorers, "New York.")));
    assert!(is_discarded(chain_score(&scorers, "COVID!")));
}

#[test]
fn sentence_without_content_words_is_demoted() {
    let scorers = SentenceScorers::new(vec![SentenceScorer::PosWeight]);
    assert_eq!(chain_score(&scorers, "And so on and on."), MINOR_PENALTY);
    assert_eq!(chain_score(&scorers, "Parliament voted."), 0.0);
}

#[test]
fn novelty_scorer_is_opt_in() {
    let config = SummarizerConfig::default();
    let model: Arc<dyn NgramModel> =
        Arc::new(BigramModel::train(["Vaccines arrived in Berlin."]));
    assert_eq!(SentenceScorers::for_cell(&config, &[], None).len(), 4);
    assert_eq!(SentenceScorers::for_cell(&config, &[], Some(model)).len(), 5);
}

// ============================================================
// Token scorer and POS prior
// ============================================================

#[test]
fn row_and_column_labels_are_discarded_as_terms() {
    let scorer = TokenScorer::new(&["DE", "Covid"]);
    assert!(is_discarded(scorer.score("covid")));
    assert!(is_discarded(scorer.score("De")));
    assert_eq!(scorer.score("vaccine"), 0.0);
}

#[test]
fn nouns_and_verbs_weigh_double() {
    assert_eq!(pos_weight(PosTag::Noun), 2.0);
    assert_eq!(pos_weight(PosTag::Verb), 2.0);
    assert_eq!(pos_weight(PosTag::Adjective), 1.0);
    assert_eq!(pos_weight(PosTag::Determiner), 1.0);
}

#[test]
fn tagger_returns_one_tag_per_token() {
    let tokens = text::tokenize("The minister quickly resigned after the vote in 2021.");
    assert_eq!(LexiconTagger.tag(&tokens).len(), tokens.len());
}

// ============================================================
// N-gram typicality
// ============================================================

#[test]
fn seen_text_is_more_typical_than_noise() {
    let model = BigramModel::train([
        "Hospitals reported new covid patients. Hospitals reported rising covid numbers.",
        "Officials reported new covid rules.",
    ]);
    let familiar = text::tokenize("Hospitals reported new covid patients.");
    let noise = text::tokenize("Zebra quantum marmalade oscillates.");
    let t_familiar = model.typicality(&familiar);
    let t_noise = model.typicality(&noise);
    assert!((0.0..=1.0).contains(&t_familiar));
    assert!((0.0..=1.0).contains(&t_noise));
    assert!(t_familiar > t_noise);
}

#[test]
fn novelty_penalty_stays_within_minor_band() {
    let model: Arc<dyn NgramModel> = Arc::new(BigramModel::train(["Hospitals filled up."]));
    let scorers = SentenceScorers::new(vec![SentenceScorer::NgramNovelty(model)]);
    let score = chain_score(&scorers, "Zebra quantum marmalade oscillates.");
    assert!(score <= 0.0 && score >= MINOR_PENALTY);
}

// ============================================================
// truncate_chars — UTF-8 safety
// ============================================================

#[test]
fn truncate_short_string_unchanged() {
    assert_eq!(truncate_chars("hello", 10), "hello");
}

#[test]
fn truncate_multibyte_does_not_panic() {
    let text = "Überschwemmungen in Sachsen — Straßen gesperrt";
    let result = truncate_chars(text, 12);
    assert_eq!(result, "Überschwemmu...");
}
