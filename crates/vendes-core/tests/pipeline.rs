//! End-to-end pipeline tests with a canned backend reply.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use vendes_core::models::config::VendesConfig;
use vendes_core::{
    aggregate, classify, parse_response, Category, ExtractionPipeline, FixedReplyBackend,
    MerchandisingGrouping, SummaryField, VendesError,
};

const DOCUMENT: &str = "\
Informe de vendes per article                       14/03/2025   Pàg. 1
Article  Descripció                 Quantitat   Import    Cost     % Marge
1001     SAMARRETA BLAVA TALLA M    3 U         45,00     20,00    55,56
2002     VISITA GUIADA GRUP
         ESCOLAR                    20 U        100,00    0,00     100,00
3003     DONACIÓ ANUAL              1 U         30,00     0,00     100,00
Total Vendes                        24 U        175,00    20,00
";

const REPLY: &str = r#"```python
[
  {"Article": "1001", "Descripció": "SAMARRETA BLAVA TALLA M", "Quantitat": "3 U", "Import": "45,00", "Cost": "20,00", "% Marge": "55,56"},
  {"Article": "2002", "Descripció": "VISITA GUIADA GRUP ESCOLAR", "Quantitat": "20 U", "Import": "100,00", "Cost": "0,00", "% Marge": "100,00"},
  {"Article": "3003", "Descripció": "DONACIÓ ANUAL", "Quantitat": "1 U", "Import": "30,00", "Cost": "0,00", "% Marge": "100,00"}
]
```"#;

fn pipeline(reply: &str) -> ExtractionPipeline<FixedReplyBackend> {
    ExtractionPipeline::new(FixedReplyBackend::new(reply), &VendesConfig::default())
}

#[test]
fn test_three_items_and_total() {
    let output = pipeline(REPLY).run(DOCUMENT).unwrap();

    assert_eq!(output.records.len(), 3);
    assert!(output.records.iter().all(|r| !r.description.starts_with("Total")));

    let summary = output.summary.unwrap();
    assert_eq!(summary.category_rows().len(), 3);
    assert_eq!(summary.total().category, "Total");
    assert_eq!(summary.total().values, vec![dec!(175.00), dec!(20.00)]);
    assert_eq!(summary.get("Visits", SummaryField::Import), Some(dec!(100.00)));
    assert_eq!(summary.get("Donation", SummaryField::Import), Some(dec!(30.00)));
    assert_eq!(
        summary.get("Merchandising (55,56% Marge)", SummaryField::Cost),
        Some(dec!(20.00))
    );
}

#[test]
fn test_document_reaches_backend_verbatim() {
    let pipeline = pipeline(REPLY);
    pipeline.run(DOCUMENT).unwrap();

    let requests = pipeline.backend().requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].0.ends_with(DOCUMENT));
    assert_eq!(requests[0].1, 0.0);
}

#[test]
fn test_total_row_matches_category_rows() {
    let summary = pipeline(REPLY).run(DOCUMENT).unwrap().summary.unwrap();

    for (idx, total) in summary.total().values.iter().enumerate() {
        let sum: Decimal = summary.category_rows().iter().map(|r| r.values[idx]).sum();
        assert_eq!(*total, sum.round_dp(2));
    }
}

#[test]
fn test_runs_are_repeatable() {
    let pipeline = pipeline(REPLY);
    let first = pipeline.run(DOCUMENT).unwrap();
    let second = pipeline.run(DOCUMENT).unwrap();
    assert_eq!(first.records, second.records);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn test_combined_merchandising() {
    let reply = r#"[
      {"Article": "1", "Descripció": "Samarreta", "Quantitat": "1 U", "Import": "10,00", "Cost": "4,00", "% Marge": "60,00"},
      {"Article": "2", "Descripció": "Tassa", "Quantitat": "1 U", "Import": "5,00", "Cost": "2,50", "% Marge": "50,00"}
    ]"#;

    let mut config = VendesConfig::default();
    config.classifier.merchandising = MerchandisingGrouping::Combined;
    let output = ExtractionPipeline::new(FixedReplyBackend::new(reply), &config)
        .run(DOCUMENT)
        .unwrap();

    let summary = output.summary.unwrap();
    assert_eq!(summary.category_rows().len(), 1);
    assert_eq!(summary.get("Merchandising", SummaryField::Import), Some(dec!(15.00)));
}

#[test]
fn test_malformed_reply_surfaces_raw_text() {
    let reply = "```\n[{'Article': '1', 'Descripció': '', 'Quantitat': '1 U', 'Import': '1,00', 'Cost': '0,00', '% Marge': '100'}]\n```";
    let err = pipeline(reply).run(DOCUMENT).unwrap_err();

    match err {
        VendesError::ResponseFormat(e) => {
            assert!(e.raw_text().starts_with("[{'Article'"));
            assert!(e.raw_text().ends_with("}]"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_amount_fails_whole_document() {
    let reply = r#"[
      {"Article": "1", "Descripció": "VISITA", "Quantitat": "1 U", "Import": "10,00", "Cost": "0,00", "% Marge": "100,00"},
      {"Article": "2", "Descripció": "Tassa", "Quantitat": "1 U", "Import": "1.234,50", "Cost": "2,50", "% Marge": "50,00"}
    ]"#;

    let err = pipeline(reply).run(DOCUMENT).unwrap_err();
    assert!(matches!(err, VendesError::MalformedNumber(ref e) if e.value() == "1.234,50"));
}

#[test]
fn test_stages_compose_like_run() {
    let records = parse_response(REPLY).unwrap();
    let classified: Vec<_> = records
        .iter()
        .map(|r| vendes_core::ClassifiedRecord {
            category: classify(&r.description, &r.margin_percent),
            record: r.clone(),
        })
        .collect();

    assert_eq!(classified[1].category, Category::Visits);

    let summary = aggregate(&classified, &SummaryField::import_cost()).unwrap();
    assert_eq!(Some(summary), pipeline(REPLY).run(DOCUMENT).unwrap().summary);
}
