use serde::{Deserialize, Serialize};

use crate::config::SentimentConfig;
use crate::dataset::{Cell, Dataset};
use crate::error::{OracleError, Result};

/// Five-point ordinal sentiment scale plus the sentinel for out-of-range
/// oracle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    MuitoRuim,
    Ruim,
    Neutro,
    Bom,
    MuitoBom,
    Desconhecido,
}

impl SentimentLabel {
    /// The five regular labels, most negative first.
    pub const ORDERED: [SentimentLabel; 5] = [
        SentimentLabel::MuitoRuim,
        SentimentLabel::Ruim,
        SentimentLabel::Neutro,
        SentimentLabel::Bom,
        SentimentLabel::MuitoBom,
    ];

    /// Star rating to label. Anything outside 1..=5 is `Desconhecido`.
    pub fn from_stars(stars: u32) -> Self {
        match stars {
            1 => Self::MuitoRuim,
            2 => Self::Ruim,
            3 => Self::Neutro,
            4 => Self::Bom,
            5 => Self::MuitoBom,
            _ => Self::Desconhecido,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "muito ruim" => Some(Self::MuitoRuim),
            "ruim" => Some(Self::Ruim),
            "neutro" => Some(Self::Neutro),
            "bom" => Some(Self::Bom),
            "muito bom" => Some(Self::MuitoBom),
            "desconhecido" => Some(Self::Desconhecido),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MuitoRuim => "muito ruim",
            Self::Ruim => "ruim",
            Self::Neutro => "neutro",
            Self::Bom => "bom",
            Self::MuitoBom => "muito bom",
            Self::Desconhecido => "desconhecido",
        }
    }

    /// `ruim` or `muito ruim`: the rows the clusterer works on.
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::MuitoRuim | Self::Ruim)
    }

    /// Coarse class for reporting. The sentinel has none.
    pub fn class(&self) -> Option<SentimentClass> {
        match self {
            Self::MuitoRuim | Self::Ruim => Some(SentimentClass::Negativo),
            Self::Neutro => Some(SentimentClass::Neutro),
            Self::Bom | Self::MuitoBom => Some(SentimentClass::Positivo),
            Self::Desconhecido => None,
        }
    }
}

/// Three-way coarsening of [`SentimentLabel`], reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positivo,
    Neutro,
    Negativo,
}

impl SentimentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positivo => "positivo",
            Self::Neutro => "neutro",
            Self::Negativo => "negativo",
        }
    }
}

/// Raw oracle output: a label such as `"4 stars"` and a confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

impl Classification {
    /// The label's first character as a star digit. Leading whitespace is
    /// malformed.
    pub fn stars(&self) -> std::result::Result<u32, OracleError> {
        self.label
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| OracleError::MalformedLabel(self.label.clone()))
    }
}

/// A pretrained text classifier, treated as a black box.
///
/// Implementations may fail per call; the scorer isolates those failures.
pub trait SentimentOracle {
    fn classify(&mut self, text: &str) -> std::result::Result<Classification, OracleError>;
}

impl<F> SentimentOracle for F
where
    F: FnMut(&str) -> std::result::Result<Classification, OracleError>,
{
    fn classify(&mut self, text: &str) -> std::result::Result<Classification, OracleError> {
        self(text)
    }
}

/// A recovered per-record failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFailure {
    /// Row index, when scoring a dataset.
    pub row: Option<usize>,
    pub preview: String,
    pub error: String,
}

/// Maps comments to labels through an oracle, collecting failures.
pub struct SentimentScorer<'a> {
    oracle: &'a mut dyn SentimentOracle,
    config: SentimentConfig,
    failures: Vec<ScoringFailure>,
    calls: usize,
}

impl<'a> SentimentScorer<'a> {
    pub fn new(oracle: &'a mut dyn SentimentOracle, config: SentimentConfig) -> Self {
        Self {
            oracle,
            config,
            failures: Vec::new(),
            calls: 0,
        }
    }

    /// Score one comment. Blank or missing comments never reach the oracle;
    /// oracle errors are logged and yield `None`.
    pub fn score(&mut self, comment: Option<&str>) -> Option<SentimentLabel> {
        self.score_row(None, comment)
    }

    fn score_row(&mut self, row: Option<usize>, comment: Option<&str>) -> Option<SentimentLabel> {
        let comment = comment.filter(|c| !c.trim().is_empty())?;
        let input = truncate_chars(comment, self.config.max_chars);
        self.calls += 1;
        match self.oracle.classify(input).and_then(|c| c.stars()) {
            Ok(stars) => Some(SentimentLabel::from_stars(stars)),
            Err(e) => {
                let preview = truncate_chars(comment, self.config.preview_chars).to_string();
                tracing::warn!(row = ?row, comment = %preview, error = %e, "sentiment scoring failed");
                self.failures.push(ScoringFailure {
                    row,
                    preview,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Number of oracle invocations so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn failures(&self) -> &[ScoringFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ScoringFailure> {
        self.failures
    }
}

/// First `max` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Score every row's comment and write the sentiment column.
///
/// Returns the enriched dataset and the recovered failures. Only a missing
/// comment column is fatal.
pub fn add_sentiments(
    mut ds: Dataset,
    oracle: &mut dyn SentimentOracle,
    config: &SentimentConfig,
    source: &str,
    target: &str,
) -> Result<(Dataset, Vec<ScoringFailure>)> {
    let col = ds.require_column(source)?;
    let mut scorer = SentimentScorer::new(oracle, config.clone());
    let labels: Vec<Cell> = (0..ds.len())
        .map(|row| {
            scorer
                .score_row(Some(row), ds.text(row, col))
                .map(|l| Cell::text(l.as_str()))
                .unwrap_or(Cell::Null)
        })
        .collect();
    tracing::info!(
        rows = ds.len(),
        oracle_calls = scorer.calls(),
        failures = scorer.failures().len(),
        "scored sentiments"
    );
    ds.set_column(target, labels)?;
    Ok((ds, scorer.into_failures()))
}

#[cfg(test)]
mod tests {
    use super::*;

    type OracleResult = std::result::Result<Classification, OracleError>;

    fn stars_oracle(label: &'static str) -> impl FnMut(&str) -> OracleResult {
        move |_| {
            Ok(Classification {
                label: label.into(),
                score: 0.9,
            })
        }
    }

    #[test]
    fn star_table() {
        assert_eq!(SentimentLabel::from_stars(1), SentimentLabel::MuitoRuim);
        assert_eq!(SentimentLabel::from_stars(2), SentimentLabel::Ruim);
        assert_eq!(SentimentLabel::from_stars(3), SentimentLabel::Neutro);
        assert_eq!(SentimentLabel::from_stars(4), SentimentLabel::Bom);
        assert_eq!(SentimentLabel::from_stars(5), SentimentLabel::MuitoBom);
        assert_eq!(SentimentLabel::from_stars(0), SentimentLabel::Desconhecido);
        assert_eq!(SentimentLabel::from_stars(9), SentimentLabel::Desconhecido);
    }

    #[test]
    fn label_string_roundtrip() {
        for l in SentimentLabel::ORDERED {
            assert_eq!(SentimentLabel::from_str(l.as_str()), Some(l));
        }
        assert_eq!(SentimentLabel::from_str("meh"), None);
    }

    #[test]
    fn blank_comments_skip_oracle() {
        let mut calls = 0;
        let mut oracle = |_: &str| -> OracleResult {
            calls += 1;
            Ok(Classification {
                label: "5 stars".into(),
                score: 1.0,
            })
        };
        let mut scorer = SentimentScorer::new(&mut oracle, SentimentConfig::default());
        assert_eq!(scorer.score(None), None);
        assert_eq!(scorer.score(Some("")), None);
        assert_eq!(scorer.score(Some("  \t\n")), None);
        assert_eq!(scorer.calls(), 0);
        drop(scorer);
        assert_eq!(calls, 0);
    }

    #[test]
    fn leading_digit_mapped() {
        let mut oracle = stars_oracle("2 stars");
        let mut scorer = SentimentScorer::new(&mut oracle, SentimentConfig::default());
        assert_eq!(scorer.score(Some("demorou demais")), Some(SentimentLabel::Ruim));

        let mut oracle = stars_oracle("1 star");
        let mut scorer = SentimentScorer::new(&mut oracle, SentimentConfig::default());
        assert_eq!(scorer.score(Some("péssimo")), Some(SentimentLabel::MuitoRuim));
    }

    #[test]
    fn out_of_range_digit_is_sentinel() {
        let mut oracle = stars_oracle("7 stars");
        let mut scorer = SentimentScorer::new(&mut oracle, SentimentConfig::default());
        assert_eq!(scorer.score(Some("texto")), Some(SentimentLabel::Desconhecido));
        assert!(scorer.failures().is_empty());
    }

    #[test]
    fn stars_reads_first_character_only() {
        let label = |l: &str| Classification {
            label: l.into(),
            score: 0.5,
        };
        assert_eq!(label("4 stars").stars().unwrap(), 4);
        assert!(matches!(label(" 4 stars").stars(), Err(OracleError::MalformedLabel(_))));
        assert!(matches!(label("").stars(), Err(OracleError::MalformedLabel(_))));
    }

    #[test]
    fn malformed_label_is_recovered() {
        let mut oracle = stars_oracle("POSITIVE");
        let mut scorer = SentimentScorer::new(&mut oracle, SentimentConfig::default());
        assert_eq!(scorer.score(Some("texto")), None);
        assert_eq!(scorer.failures().len(), 1);
    }

    #[test]
    fn input_truncated_to_max_chars() {
        let mut seen = 0;
        let mut oracle = |t: &str| -> OracleResult {
            seen = t.chars().count();
            Ok(Classification {
                label: "3 stars".into(),
                score: 0.5,
            })
        };
        let long = "ã".repeat(1500);
        let mut scorer = SentimentScorer::new(&mut oracle, SentimentConfig::default());
        assert_eq!(scorer.score(Some(&long)), Some(SentimentLabel::Neutro));
        drop(scorer);
        assert_eq!(seen, 1000);
    }

    #[test]
    fn failing_oracle_never_aborts_batch() {
        let mut oracle = |_: &str| -> OracleResult {
            Err(OracleError::Failed("boom".into()))
        };
        let mut ds = Dataset::new(vec!["comentarios".into()]);
        for c in ["um atendimento lento", "outro comentário bem longo demais", ""] {
            ds.push_row(vec![Cell::text(c)]).unwrap();
        }
        let (ds, failures) = add_sentiments(
            ds,
            &mut oracle,
            &SentimentConfig::default(),
            "comentarios",
            "sentiment",
        )
        .unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].row, Some(0));
        assert_eq!(failures[1].preview.chars().count(), 30);
        assert!(ds.column(1).all(Cell::is_null));
    }

    #[test]
    fn classes_coarsen_labels() {
        assert_eq!(SentimentLabel::Ruim.class(), Some(SentimentClass::Negativo));
        assert_eq!(SentimentLabel::Neutro.class(), Some(SentimentClass::Neutro));
        assert_eq!(SentimentLabel::MuitoBom.class(), Some(SentimentClass::Positivo));
        assert_eq!(SentimentLabel::Desconhecido.class(), None);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
