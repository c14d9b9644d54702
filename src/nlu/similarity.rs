//! TF-IDF term-vector similarity, the classifier's last tier.
//!
//! Fit once over the rule table's pattern sources (stripped of regex
//! metacharacters); scoring is cosine similarity of the query against every
//! exemplar, best score per intent, global best on top.

use std::collections::HashMap;

use super::intent::Intent;
use super::tokenize::tokenize;

/// Compute cosine similarity between two term vectors.
///
/// Returns a value between -1.0 and 1.0; 0.0 when either vector has zero
/// magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Remove regex metacharacters so a pattern source can serve as a plain-text
/// exemplar. `天气.*` becomes `天气`; a pure-meta pattern becomes empty and
/// is not used as an exemplar.
pub fn strip_regex_meta(pattern: &str) -> String {
    pattern
        .chars()
        .filter(|c| !matches!(c, '.' | '+' | '*' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'))
        .collect()
}

/// Term-vector model over intent exemplars.
pub struct SimilarityModel {
    vocab: HashMap<String, usize>,
    idf: Vec<f32>,
    exemplars: Vec<(Intent, Vec<f32>)>,
}

impl SimilarityModel {
    /// Fit the model over `(intent, pattern-source)` pairs.
    pub fn fit<'a>(sources: impl Iterator<Item = (Intent, &'a str)>) -> Self {
        let docs: Vec<(Intent, Vec<String>)> = sources
            .filter_map(|(intent, source)| {
                let cleaned = strip_regex_meta(source);
                let tokens = tokenize(&cleaned);
                if tokens.is_empty() {
                    None
                } else {
                    Some((intent, tokens))
                }
            })
            .collect();

        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut doc_frequency: Vec<usize> = Vec::new();
        for (_, tokens) in &docs {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_id = vocab.len();
                let id = *vocab.entry(token.clone()).or_insert(next_id);
                if id == doc_frequency.len() {
                    doc_frequency.push(0);
                }
                if !seen.contains(&id) {
                    doc_frequency[id] += 1;
                    seen.push(id);
                }
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n = docs.len() as f32;
        let idf: Vec<f32> = doc_frequency
            .iter()
            .map(|df| ((1.0 + n) / (1.0 + *df as f32)).ln() + 1.0)
            .collect();

        let exemplars = docs
            .iter()
            .map(|(intent, tokens)| (*intent, vectorize(tokens, &vocab, &idf)))
            .collect();

        Self {
            vocab,
            idf,
            exemplars,
        }
    }

    /// Best-scoring intent for the query, with its cosine score. `None` when
    /// the query shares no vocabulary with any exemplar.
    pub fn best_match(&self, text: &str) -> Option<(Intent, f32)> {
        let query = vectorize(&tokenize(text), &self.vocab, &self.idf);
        if query.iter().all(|v| *v == 0.0) {
            return None;
        }

        let mut per_intent: HashMap<Intent, f32> = HashMap::new();
        for (intent, vector) in &self.exemplars {
            let score = cosine_similarity(&query, vector);
            let entry = per_intent.entry(*intent).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }

        per_intent
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

fn vectorize(tokens: &[String], vocab: &HashMap<String, usize>, idf: &[f32]) -> Vec<f32> {
    let mut vector = vec![0.0_f32; vocab.len()];
    for token in tokens {
        if let Some(&id) = vocab.get(token) {
            vector[id] += idf[id];
        }
    }
    let magnitude: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for v in &mut vector {
            *v /= magnitude;
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::rules::RuleTable;
    use approx::assert_relative_eq;

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert_relative_eq!(cosine_similarity(&a, &a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_zero_magnitude() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_strip_regex_meta() {
        assert_eq!(strip_regex_meta(r"播放.*歌"), "播放歌");
        assert_eq!(strip_regex_meta(r"\d+\s*"), "ds");
        assert_eq!(strip_regex_meta(".*"), "");
    }

    #[test]
    fn test_weather_paraphrase_scores_above_threshold() {
        let table = RuleTable::standard();
        let model = SimilarityModel::fit(table.exemplars());
        let (intent, score) = model.best_match("外面在下着雨吗").unwrap();
        assert_eq!(intent, Intent::Weather);
        assert!(score > 0.15, "score {score} should clear the threshold");
    }

    #[test]
    fn test_unrelated_text_matches_nothing() {
        let table = RuleTable::standard();
        let model = SimilarityModel::fit(table.exemplars());
        assert!(model.best_match("qqqzzz").is_none());
    }
}
