use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::algo::tokenizer;

/// TF-IDF vectorizer fitted on one corpus of pre-tokenized documents.
///
/// - Vocabulary: the `max_features` terms with the highest total count
///   (ties broken alphabetically), stored in alphabetical order
/// - IDF (smoothed): `ln((1 + n) / (1 + df)) + 1`
/// - Rows: raw term counts times IDF, L2-normalized
///
/// Stopwords and single-character tokens never enter the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: Vec<String>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: Vec::new(),
            idf: Vec::new(),
        }
    }

    /// Fit the vocabulary and IDF weights on `docs`, then vectorize them.
    pub fn fit_transform(&mut self, docs: &[Vec<String>]) -> Vec<Vec<f64>> {
        self.fit(docs);
        self.transform(docs)
    }

    pub fn fit(&mut self, docs: &[Vec<String>]) {
        let mut term_freq: HashMap<&str, u32> = HashMap::new();
        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        for doc in docs {
            let mut seen: Vec<&str> = Vec::new();
            for term in doc.iter().map(String::as_str).filter(|t| accept_term(t)) {
                *term_freq.entry(term).or_insert(0) += 1;
                if !seen.contains(&term) {
                    seen.push(term);
                    *doc_freq.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, u32)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        let n = docs.len() as f64;
        self.idf = vocabulary
            .iter()
            .map(|t| {
                let df = *doc_freq.get(t.as_str()).unwrap_or(&0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = vocabulary;
    }

    /// Vectorize documents against the fitted vocabulary. Out-of-vocabulary
    /// terms are ignored; a document with none left is the zero vector.
    pub fn transform(&self, docs: &[Vec<String>]) -> Vec<Vec<f64>> {
        let index: HashMap<&str, usize> = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        docs.iter()
            .map(|doc| {
                let mut row = vec![0.0f64; self.vocabulary.len()];
                for term in doc {
                    if let Some(&i) = index.get(term.as_str()) {
                        row[i] += 1.0;
                    }
                }
                for (w, idf) in row.iter_mut().zip(&self.idf) {
                    *w *= idf;
                }
                let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for w in row.iter_mut() {
                        *w /= norm;
                    }
                }
                row
            })
            .collect()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

fn accept_term(term: &str) -> bool {
    term.chars().count() >= 2 && !tokenizer::is_stopword(term)
}
