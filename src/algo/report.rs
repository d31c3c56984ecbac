//! Aggregate tables over the enriched and clustered datasets.
//!
//! These are the numbers behind the survey charts; rendering is left to
//! whatever consumes the JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::algo::sentiment::{truncate_chars, SentimentClass, SentimentLabel};
use crate::config::{ColumnNames, ReportConfig};
use crate::dataset::Dataset;
use crate::error::Result;

/// Row counts per sentiment label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// The five labels, most negative first.
    pub counts: Vec<(String, usize)>,
    pub desconhecido: usize,
    pub unscored: usize,
}

/// Percentage of each coarse class within one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    pub region: String,
    pub total: usize,
    pub positivo: f64,
    pub neutro: f64,
    pub negativo: f64,
}

/// Percentage of each label within one service type, `muito bom` first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBreakdown {
    pub service: String,
    pub total: usize,
    pub percentages: Vec<(String, f64)>,
}

/// What a negative-comment cluster is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: String,
    pub size: usize,
    pub top_words: Vec<String>,
    pub examples: Vec<String>,
}

pub fn sentiment_distribution(ds: &Dataset, columns: &ColumnNames) -> Result<Distribution> {
    let col = ds.require_column(&columns.sentiment)?;
    let mut counts: HashMap<SentimentLabel, usize> = HashMap::new();
    let mut unscored = 0;
    for cell in ds.column(col) {
        match cell.as_text().and_then(SentimentLabel::from_str) {
            Some(label) => *counts.entry(label).or_insert(0) += 1,
            None => unscored += 1,
        }
    }
    Ok(Distribution {
        counts: SentimentLabel::ORDERED
            .iter()
            .map(|l| (l.as_str().to_string(), counts.get(l).copied().unwrap_or(0)))
            .collect(),
        desconhecido: counts.get(&SentimentLabel::Desconhecido).copied().unwrap_or(0),
        unscored,
    })
}

/// Class shares per region, sorted by positive share (highest first).
/// Rows lacking a region or a class are skipped.
pub fn sentiment_by_region(ds: &Dataset, columns: &ColumnNames) -> Result<Vec<RegionBreakdown>> {
    let region_col = ds.require_column(&columns.region)?;
    let sentiment_col = ds.require_column(&columns.sentiment)?;

    let mut tally: BTreeMap<&str, [usize; 3]> = BTreeMap::new();
    for row in 0..ds.len() {
        let Some(region) = ds.text(row, region_col) else {
            continue;
        };
        let Some(class) = ds
            .text(row, sentiment_col)
            .and_then(SentimentLabel::from_str)
            .and_then(|l| l.class())
        else {
            continue;
        };
        let slot = match class {
            SentimentClass::Positivo => 0,
            SentimentClass::Neutro => 1,
            SentimentClass::Negativo => 2,
        };
        tally.entry(region).or_insert([0; 3])[slot] += 1;
    }

    let mut out: Vec<RegionBreakdown> = tally
        .into_iter()
        .map(|(region, [pos, neu, neg])| {
            let total = pos + neu + neg;
            RegionBreakdown {
                region: region.to_string(),
                total,
                positivo: percent(pos, total),
                neutro: percent(neu, total),
                negativo: percent(neg, total),
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.positivo
            .partial_cmp(&a.positivo)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(out)
}

/// Label shares per service type, services in name order. Unscored rows
/// and the `desconhecido` sentinel are left out.
pub fn sentiment_by_service(ds: &Dataset, columns: &ColumnNames) -> Result<Vec<ServiceBreakdown>> {
    let service_col = ds.require_column(&columns.service_type)?;
    let sentiment_col = ds.require_column(&columns.sentiment)?;

    let mut tally: BTreeMap<&str, HashMap<SentimentLabel, usize>> = BTreeMap::new();
    for row in 0..ds.len() {
        let (Some(service), Some(label)) = (
            ds.text(row, service_col),
            ds.text(row, sentiment_col).and_then(SentimentLabel::from_str),
        ) else {
            continue;
        };
        if label == SentimentLabel::Desconhecido {
            continue;
        }
        *tally.entry(service).or_default().entry(label).or_insert(0) += 1;
    }

    Ok(tally
        .into_iter()
        .map(|(service, counts)| {
            let total: usize = counts.values().sum();
            ServiceBreakdown {
                service: service.to_string(),
                total,
                percentages: SentimentLabel::ORDERED
                    .iter()
                    .rev()
                    .map(|l| {
                        let c = counts.get(l).copied().unwrap_or(0);
                        (l.as_str().to_string(), percent(c, total))
                    })
                    .collect(),
            }
        })
        .collect())
}

/// Size, most frequent cleaned words and a few example comments for each
/// cluster, clusters in label order.
pub fn cluster_summaries(
    clustered: &Dataset,
    columns: &ColumnNames,
    config: &ReportConfig,
) -> Result<Vec<ClusterSummary>> {
    let cluster_col = clustered.require_column(&columns.cluster)?;
    let cleaned_col = clustered.require_column(&columns.cleaned_comment)?;
    let comment_col = clustered.require_column(&columns.comment)?;

    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for row in 0..clustered.len() {
        if let Some(label) = clustered.text(row, cluster_col) {
            members.entry(label).or_default().push(row);
        }
    }

    Ok(members
        .into_iter()
        .map(|(label, rows)| {
            let mut freq: HashMap<&str, usize> = HashMap::new();
            for &row in &rows {
                for word in clustered.text(row, cleaned_col).unwrap_or("").split_whitespace() {
                    *freq.entry(word).or_insert(0) += 1;
                }
            }
            let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
            words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            ClusterSummary {
                cluster: label.to_string(),
                size: rows.len(),
                top_words: words
                    .into_iter()
                    .take(config.top_words)
                    .map(|(w, _)| w.to_string())
                    .collect(),
                examples: rows
                    .iter()
                    .filter_map(|&row| clustered.text(row, comment_col))
                    .take(config.examples)
                    .map(|c| truncate_chars(c, config.example_chars).to_string())
                    .collect(),
            }
        })
        .collect())
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    fn enriched() -> Dataset {
        let mut ds = Dataset::new(vec![
            "tipo_de_servico".into(),
            "region".into(),
            "sentiment".into(),
        ]);
        let rows: [(&str, Option<&str>, Option<&str>); 6] = [
            ("suporte", Some("SP"), Some("muito ruim")),
            ("suporte", Some("SP"), Some("bom")),
            ("vendas", Some("RJ"), Some("muito bom")),
            ("vendas", Some("RJ"), Some("neutro")),
            ("vendas", None, Some("ruim")),
            ("suporte", Some("SP"), None),
        ];
        for (service, region, sentiment) in rows {
            ds.push_row(vec![
                Cell::text(service),
                region.map(Cell::text).unwrap_or(Cell::Null),
                sentiment.map(Cell::text).unwrap_or(Cell::Null),
            ])
            .unwrap();
        }
        ds
    }

    #[test]
    fn distribution_counts_every_label() {
        let d = sentiment_distribution(&enriched(), &ColumnNames::default()).unwrap();
        assert_eq!(d.counts.len(), 5);
        assert_eq!(d.counts[0], ("muito ruim".to_string(), 1));
        assert_eq!(d.counts[4], ("muito bom".to_string(), 1));
        assert_eq!(d.unscored, 1);
        assert_eq!(d.desconhecido, 0);
    }

    #[test]
    fn regions_sorted_by_positive_share() {
        let r = sentiment_by_region(&enriched(), &ColumnNames::default()).unwrap();
        assert_eq!(r.len(), 2);
        // RJ: 1 positive of 2 (50%), SP: 1 of 2 (50%) -> stable by name
        assert_eq!(r[0].region, "RJ");
        assert!((r[0].positivo - 50.0).abs() < 1e-9);
        assert!((r[1].negativo - 50.0).abs() < 1e-9);
        assert_eq!(r[1].total, 2);
    }

    #[test]
    fn services_in_name_order() {
        let s = sentiment_by_service(&enriched(), &ColumnNames::default()).unwrap();
        assert_eq!(s[0].service, "suporte");
        assert_eq!(s[0].total, 2);
        assert_eq!(s[0].percentages[0].0, "muito bom");
        assert_eq!(s[1].service, "vendas");
        let sum: f64 = s[1].percentages.iter().map(|(_, p)| p).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cluster_summary_words_and_examples() {
        let mut ds = Dataset::new(vec![
            "comentarios".into(),
            "cleaned_comment".into(),
            "cluster".into(),
        ]);
        for (c, cleaned, cluster) in [
            ("a fila estava enorme", "fila estava enorme", "SUPORTE_1"),
            ("fila de novo", "fila novo", "SUPORTE_1"),
            ("fila fila", "fila fila", "SUPORTE_1"),
            ("senha", "senha", "SUPORTE_2"),
        ] {
            ds.push_row(vec![Cell::text(c), Cell::text(cleaned), Cell::text(cluster)])
                .unwrap();
        }
        let s = cluster_summaries(&ds, &ColumnNames::default(), &ReportConfig::default()).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].cluster, "SUPORTE_1");
        assert_eq!(s[0].size, 3);
        assert_eq!(s[0].top_words[0], "fila");
        assert_eq!(s[0].examples.len(), 2);
        assert_eq!(s[1].top_words, vec!["senha"]);
    }
}
