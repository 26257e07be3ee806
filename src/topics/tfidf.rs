// TF-IDF keyword topic trainer.
//
// Uses the `keyword_extraction` crate to rank keywords over the training
// texts, then clusters co-occurring keywords into topics.
//
// Every sentence is treated as a separate document for IDF computation:
// words that appear everywhere get downweighted, while words distinctive to
// some sentences get boosted. This keeps IDF meaningful even when a cell
// holds a single article.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::debug;

use super::model::{normalize_masses, Topic, TopicModel};
use super::traits::TopicTrainer;
use crate::text;

/// TF-IDF based topic trainer, the default collaborator.
///
/// Deterministic, runs locally, no model files. Can be swapped for a
/// probabilistic topic model via the TopicTrainer trait.
pub struct TfIdfTopicTrainer {
    /// How many top keywords to extract before clustering
    pub top_n_keywords: usize,
    /// Maximum number of terms in one topic
    pub max_terms_per_topic: usize,
}

impl Default for TfIdfTopicTrainer {
    fn default() -> Self {
        Self {
            top_n_keywords: 60,
            max_terms_per_topic: 10,
        }
    }
}

impl TopicTrainer for TfIdfTopicTrainer {
    fn train(&self, texts: &[String], num_topics: usize) -> Result<TopicModel> {
        if num_topics == 0 {
            anyhow::bail!("Topic count must be at least 1");
        }

        let sentences: Vec<String> = texts
            .iter()
            .flat_map(|t| text::split_sentences(t))
            .filter(|s| !text::content_terms(&text::tokenize(s)).is_empty())
            .collect();
        if sentences.is_empty() {
            debug!(texts = texts.len(), "No content terms to train topics on");
            return Ok(TopicModel::empty(texts.len()));
        }

        let blob_counts: Vec<HashMap<String, u32>> =
            texts.iter().map(|t| content_counts(t)).collect();
        let mut totals: HashMap<String, u32> = HashMap::new();
        for counts in &blob_counts {
            for (term, n) in counts {
                *totals.entry(term.clone()).or_insert(0) += n;
            }
        }

        let ranked = self.rank_keywords(&sentences, &totals);
        if ranked.is_empty() {
            return Ok(TopicModel::empty(texts.len()));
        }

        let sentence_terms: Vec<HashSet<String>> = sentences
            .iter()
            .map(|s| text::tokenize(s).into_iter().collect())
            .collect();
        let clusters = cluster_keywords(
            &ranked,
            &sentence_terms,
            num_topics,
            self.max_terms_per_topic.max(1),
        );

        let topics: Vec<Arc<Topic>> = clusters
            .iter()
            .map(|cluster| Arc::new(build_topic(cluster, &totals)))
            .collect();

        // Texts sharing no term with any topic get the group's own topic
        // distribution, so every assignment sums to 1.
        let group_mass = topic_masses(&topics, &totals);
        let assignments = blob_counts
            .iter()
            .map(|counts| {
                let own = normalize_masses(topic_masses(&topics, counts));
                if own.is_empty() {
                    normalize_masses(group_mass.clone())
                } else {
                    own
                }
            })
            .collect();

        debug!(
            texts = texts.len(),
            keywords = ranked.len(),
            topics = topics.len(),
            "Trained keyword topics"
        );

        Ok(TopicModel {
            topics,
            assignments,
        })
    }
}

impl TfIdfTopicTrainer {
    /// Keywords ranked by TF-IDF, restricted to terms our tokenizer also
    /// produces (so topic queries hit the index), followed by any vocabulary
    /// the ranker skipped, by frequency. Ties are broken by term so training
    /// is reproducible.
    fn rank_keywords(&self, sentences: &[String], totals: &HashMap<String, u32>) -> Vec<String> {
        let stop_words: Vec<String> = get(LANGUAGE::English);
        let params = TfIdfParams::UnprocessedDocuments(sentences, &stop_words, None);
        let tfidf = TfIdf::new(params);

        let mut ranked: Vec<(String, f32)> = tfidf
            .get_ranked_word_scores(totals.len().max(self.top_n_keywords))
            .into_iter()
            .filter(|(word, score)| totals.contains_key(word) && score.is_finite())
            .collect();
        // Scores are compared at a fixed precision: the ranker sums floats
        // in hash order, so the last bits are not reproducible.
        let key = |score: f32| (f64::from(score) * 1e4).round() as i64;
        ranked.sort_by(|a, b| key(b.1).cmp(&key(a.1)).then_with(|| a.0.cmp(&b.0)));

        let seen: HashSet<&str> = ranked.iter().map(|(term, _)| term.as_str()).collect();
        let mut rest: Vec<(&String, &u32)> = totals
            .iter()
            .filter(|(term, _)| !seen.contains(term.as_str()))
            .collect();
        rest.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let rest: Vec<String> = rest.into_iter().map(|(term, _)| term.clone()).collect();

        ranked
            .into_iter()
            .map(|(term, _)| term)
            .chain(rest)
            .take(self.top_n_keywords)
            .collect()
    }
}

/// Occurrences of each topic's terms in `counts`, per topic index.
fn topic_masses(topics: &[Arc<Topic>], counts: &HashMap<String, u32>) -> Vec<(usize, f64)> {
    topics
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let mass: f64 = topic
                .terms
                .iter()
                .map(|(term, _)| counts.get(term).copied().unwrap_or(0) as f64)
                .sum();
            (i, mass)
        })
        .collect()
}

fn content_counts(blob: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for term in text::content_terms(&text::tokenize(blob)) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

/// Group keywords into topic clusters based on co-occurrence in sentences.
///
/// Strategy: count how often each keyword pair appears in the same
/// sentence. Then greedily build clusters by starting with the
/// highest-ranked unassigned keyword and pulling in its most co-occurring
/// unassigned neighbors.
fn cluster_keywords(
    ranked: &[String],
    sentence_terms: &[HashSet<String>],
    max_clusters: usize,
    max_terms: usize,
) -> Vec<Vec<String>> {
    let n = ranked.len();

    // For each sentence, record which keywords appear in it
    let sentence_keywords: Vec<Vec<usize>> = sentence_terms
        .iter()
        .map(|terms| {
            ranked
                .iter()
                .enumerate()
                .filter(|(_, kw)| terms.contains(*kw))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut cooccurrence = vec![vec![0u32; n]; n];
    for sk in &sentence_keywords {
        for &i in sk {
            for &j in sk {
                if i != j {
                    cooccurrence[i][j] += 1;
                }
            }
        }
    }

    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for seed_idx in 0..n {
        if clusters.len() >= max_clusters {
            break;
        }
        if assigned[seed_idx] {
            continue;
        }

        assigned[seed_idx] = true;
        let mut cluster = vec![seed_idx];

        let mut candidates: Vec<(usize, u32)> = (0..n)
            .filter(|&i| !assigned[i] && cooccurrence[seed_idx][i] > 0)
            .map(|i| (i, cooccurrence[seed_idx][i]))
            .collect();
        // Stable: equal counts keep keyword rank order
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        for (idx, _count) in candidates.into_iter().take(max_terms - 1) {
            assigned[idx] = true;
            cluster.push(idx);
        }

        clusters.push(cluster.into_iter().map(|i| ranked[i].clone()).collect());
    }

    clusters
}

/// Turn a keyword cluster into a term distribution using in-corpus counts.
fn build_topic(keywords: &[String], totals: &HashMap<String, u32>) -> Topic {
    let total: f64 = keywords
        .iter()
        .map(|k| totals.get(k).copied().unwrap_or(0) as f64)
        .sum();

    let mut terms: Vec<(String, f64)> = keywords
        .iter()
        .map(|k| {
            let count = totals.get(k).copied().unwrap_or(0) as f64;
            let p = if total > 0.0 {
                count / total
            } else {
                1.0 / keywords.len() as f64
            };
            (k.clone(), p)
        })
        .collect();
    terms.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    Topic {
        label: generate_topic_label(&terms),
        terms,
    }
}

/// Takes the first 2-3 terms and joins them with " / ".
fn generate_topic_label(terms: &[(String, f64)]) -> String {
    let label_words: Vec<&str> = terms.iter().take(3).map(|(t, _)| t.as_str()).collect();
    label_words.join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> Vec<String> {
        vec![
            "Vaccine trials expanded across Berlin hospitals. Vaccine supply improved."
                .to_string(),
            "Hospitals in Munich reported vaccine shortages during winter.".to_string(),
            "Parliament debated energy prices and gas imports. Energy prices climbed."
                .to_string(),
            "Gas imports from Norway stabilised energy markets.".to_string(),
        ]
    }

    #[test]
    fn train_basic() {
        let trainer = TfIdfTopicTrainer::default();
        let model = trainer.train(&texts(), 3).unwrap();

        assert!(!model.topics.is_empty());
        assert!(model.topics.len() <= 3);
        assert_eq!(model.assignments.len(), 4);

        for topic in &model.topics {
            let sum: f64 = topic.terms.iter().map(|(_, p)| p).sum();
            assert!((sum - 1.0).abs() < 1e-9, "Topic probabilities sum to {sum}");
            assert!(topic.terms.len() <= trainer.max_terms_per_topic);
        }
        for assignment in &model.assignments {
            let sum: f64 = assignment.iter().map(|(_, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-9, "Mixture sums to {sum}");
        }
    }

    #[test]
    fn text_outside_every_cluster_gets_group_distribution() {
        let texts = vec![
            "Vaccine deliveries reached Berlin hospitals. Nurses welcomed the vaccine.".to_string(),
            "Berlin hospitals expanded vaccine appointments for nurses.".to_string(),
            "Tornado flattened barns across Kansas farmland yesterday.".to_string(),
        ];
        let model = TfIdfTopicTrainer::default().train(&texts, 1).unwrap();

        assert_eq!(model.topics.len(), 1);
        for assignment in &model.assignments {
            assert_eq!(assignment, &vec![(0, 1.0)]);
        }
    }

    #[test]
    fn training_is_reproducible() {
        let trainer = TfIdfTopicTrainer::default();
        let a = trainer.train(&texts(), 2).unwrap();
        let b = trainer.train(&texts(), 2).unwrap();
        assert_eq!(a.topics, b.topics);
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn degenerate_input_yields_no_topics() {
        let trainer = TfIdfTopicTrainer::default();
        let model = trainer.train(&["".to_string(), "   ".to_string()], 3).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.assignments.len(), 2);
        assert!(model.assignments.iter().all(Vec::is_empty));
    }

    #[test]
    fn zero_topics_is_an_error() {
        assert!(TfIdfTopicTrainer::default().train(&texts(), 0).is_err());
    }

    #[test]
    fn single_text_respects_topic_count() {
        let trainer = TfIdfTopicTrainer::default();
        let model = trainer
            .train(&["Flooding closed roads near Dresden on Monday.".to_string()], 2)
            .unwrap();
        assert!(model.topics.len() <= 2);
        let mixture = &model.assignments[0];
        assert!(!mixture.is_empty() && mixture.len() <= 2);
        let sum: f64 = mixture.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
