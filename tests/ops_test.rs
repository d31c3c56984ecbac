use nu_plugin_survey::algo::sentiment::Classification;
use nu_plugin_survey::config::SurveyConfig;
use nu_plugin_survey::dataset::{Cell, Dataset};
use nu_plugin_survey::error::{OracleError, SurveyError};
use nu_plugin_survey::{io, ops};
use serde_json::{json, Value};

type OracleResult = Result<Classification, OracleError>;

fn survey_rows() -> Vec<Value> {
    vec![
        json!({"Comentários": "  Ótimo atendimento ", "Tipo de Serviço": "Suporte", "Localização": "São Paulo/SP/São Paulo"}),
        json!({"Comentários": "Demorou muito", "Tipo de Serviço": "Vendas", "Localização": "Rio de Janeiro/RJ"}),
        json!({"Comentários": "nan", "Tipo de Serviço": "Suporte", "Localização": null}),
    ]
}

fn raw(rows: &[Value]) -> Dataset {
    Dataset::from_json_rows(rows).unwrap()
}

/// One star for anything mentioning delays, five otherwise.
fn keyword_oracle(text: &str) -> OracleResult {
    let label = if text.contains("demor") || text.contains("fila") {
        "1 star"
    } else {
        "5 stars"
    };
    Ok(Classification {
        label: label.into(),
        score: 0.8,
    })
}

fn column<'a>(ds: &'a Dataset, name: &str) -> Vec<Option<&'a str>> {
    let col = ds.require_column(name).unwrap();
    (0..ds.len()).map(|r| ds.text(r, col)).collect()
}

#[test]
fn end_to_end_three_rows() {
    let config = SurveyConfig::default();
    let mut oracle = keyword_oracle;
    let out = ops::op_run(raw(&survey_rows()), &mut oracle, &config).unwrap();

    assert_eq!(
        out.enriched.columns(),
        &["comentarios", "tipo_de_servico", "localizacao", "region", "sentiment"]
    );
    assert_eq!(out.enriched.len(), 3);

    assert_eq!(
        column(&out.enriched, "comentarios"),
        vec![Some("ótimo atendimento"), Some("demorou muito"), None]
    );
    assert_eq!(column(&out.enriched, "region"), vec![Some("SP"), Some("RJ"), None]);
    assert_eq!(
        column(&out.enriched, "sentiment"),
        vec![Some("muito bom"), Some("muito ruim"), None]
    );
    assert!(out.failures.is_empty());

    assert_eq!(out.clustered.len(), 1);
    assert_eq!(column(&out.clustered, "cluster"), vec![Some("VENDAS_1")]);
    assert_eq!(column(&out.clustered, "cleaned_comment"), vec![Some("demorou")]);
}

#[test]
fn failing_oracle_still_finishes() {
    let mut calls = 0;
    let mut oracle = |_: &str| -> OracleResult {
        calls += 1;
        Err(OracleError::Failed("model unavailable".into()))
    };
    let out = ops::op_run(raw(&survey_rows()), &mut oracle, &SurveyConfig::default()).unwrap();
    assert_eq!(calls, 2);
    assert_eq!(column(&out.enriched, "sentiment"), vec![None, None, None]);
    assert_eq!(out.failures.len(), 2);
    assert_eq!(out.failures[0].row, Some(0));
    assert!(out.clustered.is_empty());
}

#[test]
fn malformed_label_is_recovered() {
    let mut oracle = |_: &str| -> OracleResult {
        Ok(Classification {
            label: "POSITIVE".into(),
            score: 0.99,
        })
    };
    let out = ops::op_run(raw(&survey_rows()), &mut oracle, &SurveyConfig::default()).unwrap();
    assert_eq!(column(&out.enriched, "sentiment"), vec![None, None, None]);
    assert_eq!(out.failures.len(), 2);
}

#[test]
fn out_of_range_stars_are_desconhecido() {
    let mut oracle = |_: &str| -> OracleResult {
        Ok(Classification {
            label: "9 stars".into(),
            score: 0.5,
        })
    };
    let out = ops::op_run(raw(&survey_rows()), &mut oracle, &SurveyConfig::default()).unwrap();
    assert_eq!(
        column(&out.enriched, "sentiment"),
        vec![Some("desconhecido"), Some("desconhecido"), None]
    );
    let report = ops::op_report(&out, &SurveyConfig::default()).unwrap();
    assert_eq!(report.distribution.desconhecido, 2);
    assert_eq!(report.distribution.unscored, 1);
}

#[test]
fn missing_location_fails_in_region_stage() {
    let rows = vec![json!({"Comentários": "ok", "Tipo de Serviço": "suporte"})];
    let mut oracle = keyword_oracle;
    let err = ops::op_run(raw(&rows), &mut oracle, &SurveyConfig::default()).unwrap_err();
    match err {
        SurveyError::Stage { stage, source } => {
            assert_eq!(stage, "region");
            assert!(matches!(*source, SurveyError::MissingColumn(ref c) if c == "localizacao"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparsable_duration_fails_in_normalize_stage() {
    let rows = vec![
        json!({"Comentários": "ok", "Duração Média das Chamadas": "12.5"}),
        json!({"Comentários": "ok", "Duração Média das Chamadas": "doze"}),
    ];
    let err = ops::op_normalize(raw(&rows), &SurveyConfig::default()).unwrap_err();
    assert!(err.to_string().starts_with("normalize stage failed"), "{err}");
}

#[test]
fn null_duration_becomes_zero() {
    let rows = vec![
        json!({"Comentários": "ok", "Duração Média das Chamadas": "12.5"}),
        json!({"Comentários": "ok", "Duração Média das Chamadas": null}),
    ];
    let ds = ops::op_normalize(raw(&rows), &SurveyConfig::default()).unwrap();
    let col = ds.require_column("duracao_media_das_chamadas").unwrap();
    assert_eq!(ds.cell(0, col), &Cell::Number(12.5));
    assert_eq!(ds.cell(1, col), &Cell::Number(0.0));
}

#[test]
fn zero_clusters_is_a_configuration_error() {
    let mut config = SurveyConfig::default();
    config.clustering.n_clusters = 0;
    let mut oracle = keyword_oracle;
    let err = ops::op_run(raw(&survey_rows()), &mut oracle, &config).unwrap_err();
    assert!(matches!(err, SurveyError::Configuration(_)));
}

fn complaints() -> Vec<Value> {
    let comments = [
        ("A fila estava enorme, esperei demais", "Suporte", "Recife/PE"),
        ("Fila longa e espera absurda", "Suporte", "Recife/PE"),
        ("Senha bloqueada, não consigo acessar", "Suporte", "Natal/RN"),
        ("Minha senha foi bloqueada de novo", "Suporte", "Natal/RN"),
        ("Cobrança errada no boleto", "Suporte", "Recife/PE"),
        ("Boleto veio com cobrança duplicada", "Suporte", "Natal/RN"),
        ("Entrega demorou três semanas", "Vendas", "Belém/PA"),
        ("Atendimento excelente", "Vendas", "Belém/PA"),
    ];
    comments
        .iter()
        .map(|(c, s, l)| json!({"Comentários": c, "Tipo de Serviço": s, "Localização": l}))
        .collect()
}

fn complaint_oracle(text: &str) -> OracleResult {
    let label = if text.contains("excelente") { "5 stars" } else { "2 stars" };
    Ok(Classification {
        label: label.into(),
        score: 0.7,
    })
}

#[test]
fn clusters_per_service_and_reproducible() {
    let config = SurveyConfig::default();
    let mut oracle = complaint_oracle;
    let a = ops::op_run(raw(&complaints()), &mut oracle, &config).unwrap();
    let mut oracle = complaint_oracle;
    let b = ops::op_run(raw(&complaints()), &mut oracle, &config).unwrap();
    assert_eq!(a.clustered, b.clustered);

    assert_eq!(a.clustered.len(), 7);
    let labels = column(&a.clustered, "cluster");
    assert!(labels[..6].iter().all(|l| l.is_some_and(|l| l.starts_with("SUPORTE_"))));
    assert_eq!(labels[6], Some("VENDAS_1"));
    assert_eq!(a.groups.len(), 2);
    assert_eq!(a.groups[0].service, "suporte");
    assert_eq!(a.groups[0].clusters, 3);
}

#[test]
fn report_serializes_to_json() {
    let config = SurveyConfig::default();
    let mut oracle = complaint_oracle;
    let out = ops::op_run(raw(&complaints()), &mut oracle, &config).unwrap();
    let report = ops::op_report(&out, &config).unwrap();

    assert_eq!(report.total_rows, 8);
    assert_eq!(report.negative_rows, 7);
    assert_eq!(report.by_region[0].region, "PA");
    assert_eq!(report.by_service.len(), 2);
    assert!(report.clusters.iter().all(|c| c.examples.len() <= 2));
    assert!(report.clusters.iter().all(|c| c.top_words.len() <= 5));

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["total_rows"], json!(8));
    assert!(value["clusters"].as_array().is_some_and(|c| !c.is_empty()));
}

#[test]
fn csv_round_trip_through_pipeline() {
    let data = "Comentários,Tipo de Serviço,Localização\n\
                Demorou demais,Suporte,Curitiba/PR\n\
                ,Suporte,-\n";
    let ds = io::read_csv(data.as_bytes()).unwrap();
    let mut oracle = keyword_oracle;
    let out = ops::op_run(ds, &mut oracle, &SurveyConfig::default()).unwrap();
    let mut buf = Vec::new();
    io::write_csv(&out.enriched, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("comentarios,tipo_de_servico,localizacao,region,sentiment\n"));
    assert!(text.contains("demorou demais,suporte,curitiba/pr,PR,muito ruim"));
}
