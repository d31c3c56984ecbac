use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algo::kmeans::{self, KMeansConfig};
use crate::algo::sentiment::SentimentLabel;
use crate::algo::tfidf::TfidfVectorizer;
use crate::algo::tokenizer;
use crate::config::{ClusterConfig, ColumnNames};
use crate::dataset::{Cell, Dataset};
use crate::error::Result;

/// Why a group got the single degenerate cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Fewer rows than the requested cluster count.
    TooSmall,
    /// No comment in the group kept a single vocabulary term.
    EmptyVocabulary,
}

/// How one service group was partitioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub service: String,
    pub rows: usize,
    pub clusters: usize,
    pub fallback: Option<Fallback>,
}

/// Cluster ids (1-based) for one group's documents.
///
/// Each call fits its own vectorizer and k-means model; nothing is shared
/// between groups.
pub fn cluster_group(docs: &[Vec<String>], config: &ClusterConfig) -> (Vec<usize>, Option<Fallback>) {
    if docs.len() < config.n_clusters {
        return (vec![1; docs.len()], Some(Fallback::TooSmall));
    }

    let mut vectorizer = TfidfVectorizer::new(config.max_vocab);
    let vectors = vectorizer.fit_transform(docs);
    if vectorizer.is_empty() {
        return (vec![1; docs.len()], Some(Fallback::EmptyVocabulary));
    }

    let result = kmeans::kmeans(
        &vectors,
        &KMeansConfig {
            k: config.n_clusters,
            max_iter: config.max_iter,
            n_init: config.n_init,
            tolerance: config.tolerance,
            seed: config.seed,
        },
    );
    (result.labels.into_iter().map(|l| l + 1).collect(), None)
}

/// `"<SERVICE>_<N>"`.
pub fn cluster_label(service: &str, id: usize) -> String {
    format!("{}_{id}", service.to_uppercase())
}

/// Cluster the negative comments of `ds` within each service type.
///
/// Returns a copy holding only the `ruim`/`muito ruim` rows, in their
/// original order, with the cleaned-comment and cluster columns added, plus
/// one outcome per service group. Rows without a service type get no
/// cluster.
pub fn cluster_negative_comments(
    ds: &Dataset,
    columns: &ColumnNames,
    config: &ClusterConfig,
) -> Result<(Dataset, Vec<GroupOutcome>)> {
    let sentiment_col = ds.require_column(&columns.sentiment)?;
    let comment_col = ds.require_column(&columns.comment)?;
    let service_col = ds.require_column(&columns.service_type)?;

    let negative: Vec<usize> = (0..ds.len())
        .filter(|&row| {
            ds.text(row, sentiment_col)
                .and_then(SentimentLabel::from_str)
                .is_some_and(|l| l.is_negative())
        })
        .collect();
    let mut subset = ds.select_rows(&negative);

    let cleaned: Vec<String> = (0..subset.len())
        .into_par_iter()
        .map(|row| tokenizer::clean_comment(subset.text(row, comment_col)))
        .collect();

    // Groups in first-appearance order.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut unassigned = 0usize;
    for row in 0..subset.len() {
        match subset.text(row, service_col) {
            Some(service) => match groups.iter_mut().find(|(s, _)| s == service) {
                Some((_, members)) => members.push(row),
                None => groups.push((service.to_string(), vec![row])),
            },
            None => unassigned += 1,
        }
    }
    if unassigned > 0 {
        tracing::warn!(rows = unassigned, "negative comments without a service type left unclustered");
    }

    let results: Vec<(Vec<usize>, Option<Fallback>)> = groups
        .par_iter()
        .map(|(_, members)| {
            let docs: Vec<Vec<String>> = members
                .iter()
                .map(|&row| cleaned[row].split_whitespace().map(String::from).collect())
                .collect();
            cluster_group(&docs, config)
        })
        .collect();

    let mut labels = vec![Cell::Null; subset.len()];
    let mut outcomes = Vec::with_capacity(groups.len());
    for ((service, members), (ids, fallback)) in groups.iter().zip(results) {
        let clusters = ids.iter().max().copied().unwrap_or(0);
        match fallback {
            Some(reason) => tracing::debug!(service = %service, rows = members.len(), ?reason, "degenerate cluster"),
            None => tracing::debug!(service = %service, rows = members.len(), clusters, "clustered group"),
        }
        for (&row, id) in members.iter().zip(ids) {
            labels[row] = Cell::Text(cluster_label(service, id));
        }
        outcomes.push(GroupOutcome {
            service: service.clone(),
            rows: members.len(),
            clusters,
            fallback,
        });
    }

    subset.set_column(
        &columns.cleaned_comment,
        cleaned.into_iter().map(Cell::Text).collect(),
    )?;
    subset.set_column(&columns.cluster, labels)?;
    tracing::info!(
        negative_rows = subset.len(),
        groups = outcomes.len(),
        "clustered negative comments"
    );
    Ok((subset, outcomes))
}
