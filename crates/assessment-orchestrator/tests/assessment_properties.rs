use std::sync::Arc;

use assessment_core::{AssessmentParams, EngineError, LanguagePolicy, Phrasebook, ValidationError};
use assessment_orchestrator::{AssessmentOrchestrator, ExecutionMode};
use benchmark_engine::BenchmarkTable;
use serde_json::{json, Value};

fn orchestrator() -> AssessmentOrchestrator {
    AssessmentOrchestrator::new(
        AssessmentParams::default(),
        Arc::new(BenchmarkTable::bundled().unwrap()),
        Arc::new(Phrasebook::bundled().unwrap()),
    )
}

fn example_intake() -> Value {
    json!({
        "business_name": "Apex Traders",
        "industry": "Retail",
        "region": "Maharashtra",
        "revenue": 1_250_000,
        "prior_revenue": 1_180_000,
        "expenses": 860_000,
        "cogs": 620_000,
        "receivables": 180_000,
        "payables": 140_000,
        "inventory": 220_000,
        "debt": 350_000,
        "cash_on_hand": 90_000,
        "monthly_burn": 25_000,
        "tax_liability": 52_000,
        "deductions": 18_000,
        "language": "en"
    })
}

fn with(mut intake: Value, field: &str, value: Value) -> Value {
    intake[field] = value;
    intake
}

fn metric_value(report: &Value, name: &str) -> Value {
    report["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == name)
        .map(|m| m["value"].clone())
        .unwrap()
}

fn numeric_fields(report: &Value) -> Vec<Value> {
    let mut numbers = vec![report["risk_score"].clone(), report["credit_score"].clone()];
    for c in report["component_scores"].as_array().unwrap() {
        numbers.push(c["score"].clone());
    }
    for m in report["metrics"].as_array().unwrap() {
        numbers.push(m["value"].clone());
    }
    numbers
}

#[tokio::test]
async fn test_example_snapshot_end_to_end() {
    let report = orchestrator().assess(&example_intake()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(metric_value(&json, "Revenue Growth (%)"), json!(5.93));
    assert_eq!(metric_value(&json, "Cash Runway (months)"), json!(3.6));
    assert_eq!(metric_value(&json, "Quick Ratio"), json!(1.93));

    assert!(report.forecast_summary.contains("tight at 3.6 months"));
    assert_eq!(report.health_label, "Strong");
    assert!(!report.narrative.is_empty());
    assert!(report.narrative.contains(&report.health_label));

    assert_eq!(report.component_scores.len(), 5);
    assert_eq!(report.component_scores[0].name, "Liquidity");
    assert_eq!(report.component_scores[0].score, 100.0);
    // Deductions cover only 0.35 of the tax liability
    assert_eq!(report.risk_alerts.len(), 1);
    assert!(report.risk_alerts[0].message.starts_with("Tax coverage of 0.35"));
    assert_eq!(report.metrics.len(), 13);
    assert!(report.benchmark_summary.starts_with("Compared with Retail businesses in Maharashtra"));
}

#[tokio::test]
async fn test_report_shape_matches_contract() {
    let report = orchestrator().assess(&example_intake()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort();

    assert_eq!(
        keys,
        vec![
            "benchmark_summary",
            "component_scores",
            "credit_score",
            "forecast_summary",
            "health_label",
            "metrics",
            "narrative",
            "product_recommendations",
            "recommendations",
            "risk_alerts",
            "risk_score",
        ]
    );
    assert!(json["risk_alerts"].is_array());
    assert!(json["product_recommendations"][0]["rationale"].is_string());
}

#[tokio::test]
async fn test_scores_bounded_and_label_matches_band() {
    let engine = orchestrator();
    let variants = vec![
        example_intake(),
        with(example_intake(), "cash_on_hand", json!(0)),
        with(example_intake(), "expenses", json!(1_400_000)),
        with(example_intake(), "revenue", json!(0)),
        with(example_intake(), "debt", json!(9_000_000)),
        with(example_intake(), "prior_revenue", json!(4_000_000)),
    ];

    for intake in variants {
        let report = engine.assess(&intake).await.unwrap();
        assert!((0.0..=100.0).contains(&report.credit_score));
        assert!((0.0..=100.0).contains(&report.risk_score));

        let expected = match report.credit_score {
            s if s >= 80.0 => "Strong",
            s if s >= 60.0 => "Stable",
            s if s >= 40.0 => "Watch",
            _ => "Distressed",
        };
        assert_eq!(report.health_label, expected);
    }
}

#[tokio::test]
async fn test_identical_input_gives_identical_report() {
    let engine = orchestrator();
    let first = serde_json::to_string(&engine.assess(&example_intake()).await.unwrap()).unwrap();
    let second = serde_json::to_string(&engine.assess(&example_intake()).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_language_changes_prose_only() {
    let engine = orchestrator();
    let en = engine.assess(&example_intake()).await.unwrap();
    let hi = engine
        .assess(&with(example_intake(), "language", json!("hi")))
        .await
        .unwrap();

    let en_json = serde_json::to_value(&en).unwrap();
    let hi_json = serde_json::to_value(&hi).unwrap();
    assert_eq!(numeric_fields(&en_json), numeric_fields(&hi_json));

    assert_ne!(en.narrative, hi.narrative);
    assert_ne!(en.health_label, hi.health_label);
    assert_ne!(en.forecast_summary, hi.forecast_summary);
    assert_eq!(
        en.product_recommendations.len(),
        hi.product_recommendations.len()
    );
}

#[tokio::test]
async fn test_zero_payables_does_not_crash() {
    let report = orchestrator()
        .assess(&with(example_intake(), "payables", json!(0)))
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(metric_value(&json, "Quick Ratio").is_null());
    assert!(metric_value(&json, "Current Ratio").is_null());
    // Absent liquidity ratios take the missing-data penalty, not a zero
    assert_eq!(report.component_scores[0].score, 40.0);
}

#[tokio::test]
async fn test_more_cash_never_lowers_liquidity() {
    let engine = orchestrator();
    let mut previous = -1.0;
    for cash in (0..=200_000).step_by(20_000) {
        let intake = with(
            with(example_intake(), "receivables", json!(10_000)),
            "cash_on_hand",
            json!(cash),
        );
        let report = engine.assess(&intake).await.unwrap();
        let liquidity = report.component_scores[0].score;
        assert!(liquidity >= previous);
        previous = liquidity;
    }
}

#[tokio::test]
async fn test_sliding_into_loss_never_improves_scores() {
    let engine = orchestrator();
    let base = with(
        with(example_intake(), "revenue", json!(1_000_000)),
        "debt",
        json!(350_000),
    );

    let mut previous_credit = f64::MAX;
    let mut previous_risk = f64::MIN;
    for expenses in (950_000..=1_100_000).step_by(10_000) {
        let report = engine
            .assess(&with(base.clone(), "expenses", json!(expenses)))
            .await
            .unwrap();
        assert!(report.credit_score <= previous_credit, "credit rose at {expenses}");
        assert!(report.risk_score >= previous_risk, "risk fell at {expenses}");
        previous_credit = report.credit_score;
        previous_risk = report.risk_score;
    }

    let barely = engine
        .assess(&with(base.clone(), "expenses", json!(999_000)))
        .await
        .unwrap();
    let loss = engine
        .assess(&with(base, "expenses", json!(1_050_000)))
        .await
        .unwrap();
    assert!(loss.credit_score <= barely.credit_score);
    assert!(loss.risk_score >= barely.risk_score);
}

#[tokio::test]
async fn test_leverage_alert_boundary_is_inclusive() {
    let engine = orchestrator();
    // Operating surplus of 100,000 so leverage equals debt / 100,000
    let base = with(
        with(example_intake(), "revenue", json!(1_000_000)),
        "expenses",
        json!(900_000),
    );

    let at = engine
        .assess(&with(base.clone(), "debt", json!(300_000)))
        .await
        .unwrap();
    assert!(at.risk_alerts.iter().any(|a| a.message.starts_with("Leverage of 3.00")));

    let below = engine
        .assess(&with(base, "debt", json!(299_999)))
        .await
        .unwrap();
    assert!(below.risk_alerts.iter().all(|a| !a.message.starts_with("Leverage")));
}

#[tokio::test]
async fn test_unsupported_language_falls_back_consistently() {
    let engine = orchestrator();
    let en = engine.assess(&example_intake()).await.unwrap();
    for _ in 0..3 {
        let fr = engine
            .assess(&with(example_intake(), "language", json!("fr")))
            .await
            .unwrap();
        assert_eq!(fr, en);
    }
}

#[tokio::test]
async fn test_strict_policy_rejects_unsupported_language() {
    let engine = orchestrator().with_language_policy(LanguagePolicy::Strict);
    let err = engine
        .assess(&with(example_intake(), "language", json!("fr")))
        .await
        .unwrap_err();
    match err {
        EngineError::UnsupportedLanguage(e) => assert_eq!(e.code, "fr"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_sequential_matches_concurrent() {
    let concurrent = orchestrator();
    let sequential = orchestrator().with_execution_mode(ExecutionMode::Sequential);

    for intake in [
        example_intake(),
        with(example_intake(), "monthly_burn", json!(0)),
        with(example_intake(), "cash_on_hand", json!(5_000)),
        with(example_intake(), "language", json!("hi")),
    ] {
        let a = serde_json::to_string(&concurrent.assess(&intake).await.unwrap()).unwrap();
        let b = serde_json::to_string(&sequential.assess(&intake).await.unwrap()).unwrap();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_validation_error_names_field() {
    let mut intake = example_intake();
    intake.as_object_mut().unwrap().remove("cogs");

    let err = orchestrator().assess(&intake).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(ValidationError::Missing { field: "cogs" })
    );
    assert_eq!(err.to_string(), "cogs: required field is missing");
}

#[tokio::test]
async fn test_no_burn_is_reported() {
    let report = orchestrator()
        .assess(&with(example_intake(), "monthly_burn", json!(0)))
        .await
        .unwrap();
    assert!(report.forecast_summary.starts_with("The business is not burning cash"));
}
