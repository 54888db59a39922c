//! Commands parsed from argument lists and run against the bundled
//! configuration and an in-memory store.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tax_cli::{App, Capabilities, Cli, Report, build_registry, load_config, output};
use tax_core::db::DbConfig;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

/// Money is serialized as a string so it round-trips exactly.
fn decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected a decimal string, got {value}"))
        .parse()
        .unwrap()
}

async fn open_app() -> App {
    App::open(
        load_config(None).unwrap(),
        Capabilities::full(),
        &build_registry(),
        &DbConfig::new("sqlite", ":memory:"),
        as_of(),
    )
    .await
    .unwrap_or_else(|e| panic!("failed to open app: {e:#}"))
}

async fn run(
    app: &App,
    args: &[&str],
) -> anyhow::Result<Report> {
    let cli = Cli::try_parse_from(std::iter::once("tax-planner").chain(args.iter().copied()))?;
    app.run(&cli.command).await
}

// =============================================================================
// Projection
// =============================================================================

#[tokio::test]
async fn project_json_reports_federal_tax() {
    let app = open_app().await;

    let report = run(&app, &["project", "--income", "450,000", "--withheld", "federal=80000"])
        .await
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&output::render(&report, true).unwrap()).unwrap();

    let federal = json["jurisdictions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|j| j["jurisdiction"] == "federal")
        .unwrap();
    assert_eq!(decimal(&federal["tax"]), dec!(88526));
    assert_eq!(decimal(&federal["withheld"]), dec!(80000));
    assert_eq!(decimal(&json["fica"]["social_security"]), dec!(10918.20));
}

#[tokio::test]
async fn project_text_lists_every_jurisdiction() {
    let app = open_app().await;

    let report = run(&app, &["project", "--income", "300000", "--sourced", "state-b=40000"])
        .await
        .unwrap();
    let text = output::render(&report, false).unwrap();

    assert!(text.contains("Federal tax"), "{text}");
    assert!(text.contains("California tax"), "{text}");
    assert!(text.contains("Oklahoma tax"), "{text}");
    assert!(text.contains("credit for state-b"), "{text}");
    assert!(text.contains("Balance due"), "{text}");
}

#[tokio::test]
async fn negative_income_is_reported_not_clamped() {
    let app = open_app().await;

    let err = run(&app, &["project", "--income", "-5000"]).await.unwrap_err();

    assert!(format!("{err:#}").contains("invalid full_year_income"), "{err:#}");
}

#[tokio::test]
async fn unknown_withholding_jurisdiction_is_rejected() {
    let app = open_app().await;

    let err = run(&app, &["project", "--income", "100000", "--withheld", "state-z=100"])
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("unknown jurisdiction 'state-z'"), "{err:#}");
}

// =============================================================================
// RSU import feeding a quarterly schedule
// =============================================================================

#[tokio::test]
async fn imported_schedule_feeds_summary_and_quarterly() {
    let app = open_app().await;
    let path = fixture("vesting_2025.csv");

    let Report::VestingImport { imported, warnings } =
        run(&app, &["rsu", "import", path.to_str().unwrap()]).await.unwrap()
    else {
        panic!("expected import report");
    };
    assert_eq!(imported.len(), 5);
    assert_eq!(warnings, Vec::new());
    assert_eq!(imported[0].details.symbol, "GOOG");
    assert_eq!(imported[0].total_value(), dec!(9000.00));

    let Report::VestingSummary { summary, income, .. } =
        run(&app, &["rsu", "summary"]).await.unwrap()
    else {
        panic!("expected summary report");
    };
    assert_eq!(summary.total_grants, 2);
    assert_eq!(summary.total_shares_granted, 220);
    assert_eq!(summary.total_shares_vested, 100);
    assert_eq!(summary.total_shares_pending, 120);
    assert_eq!(summary.value_vested, dec!(17775.00));
    assert_eq!(summary.value_pending, dec!(27900.00));
    assert_eq!(income.total, dec!(37275.00));

    let Report::VestingEvents(grant) = run(&app, &["rsu", "grant", "GRANT-200"]).await.unwrap()
    else {
        panic!("expected event list");
    };
    assert_eq!(grant.len(), 1);

    let Report::Quarterly(schedule) = run(
        &app,
        &["quarterly", "--income", "200000", "--include-stored-rsu"],
    )
    .await
    .unwrap() else {
        panic!("expected quarterly schedule");
    };
    let total: Decimal = schedule.estimates.iter().map(|e| e.total_amount).sum();
    assert_eq!(total, schedule.annual_liability);
}

#[tokio::test]
async fn marking_paid_reduces_remaining_requirement() {
    let app = open_app().await;
    let inputs = [
        "--income",
        "450000",
        "--prior-year-liability",
        "60000",
        "--prior-year-agi",
        "400000",
    ];
    let quarterly: Vec<&str> = std::iter::once("quarterly").chain(inputs).collect();
    let mark_paid: Vec<&str> = ["mark-paid", "1", "$16,500"].into_iter().chain(inputs).collect();

    let Report::Quarterly(before) = run(&app, &quarterly).await.unwrap() else {
        panic!("expected quarterly schedule");
    };
    let Report::QuarterEstimate(marked) = run(&app, &mark_paid).await.unwrap() else {
        panic!("expected quarter estimate");
    };
    let Report::Quarterly(after) = run(&app, &quarterly).await.unwrap() else {
        panic!("expected quarterly schedule");
    };

    assert!(marked.paid);
    assert_eq!(marked.paid_amount, Some(dec!(16500)));
    assert_eq!(marked.total_amount, before.estimates[0].total_amount);

    // 110% of the prior year applies above the AGI threshold.
    assert_eq!(before.safe_harbor.prior_year_amount, Some(dec!(66000.00)));
    assert_eq!(
        after.safe_harbor.remaining_required,
        before.safe_harbor.remaining_required - dec!(16500)
    );
    assert_eq!(after.estimates[0].paid_amount, Some(dec!(16500)));
}

#[tokio::test]
async fn negative_payment_is_rejected() {
    let app = open_app().await;

    let err = run(&app, &["mark-paid", "1", "-1", "--income", "100000"])
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("invalid amount"), "{err:#}");
}

#[tokio::test]
async fn unmark_paid_echoes_cleared_estimate_as_json() {
    let app = open_app().await;
    run(&app, &["mark-paid", "4", "1000", "--income", "250000"]).await.unwrap();

    let report = run(&app, &["unmark-paid", "4", "--income", "250000"]).await.unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&output::render(&report, true).unwrap()).unwrap();

    assert_eq!(json["quarter"], serde_json::json!(4));
    assert_eq!(json["due_date"], serde_json::json!("2026-01-15"));
    assert_eq!(json["paid"], serde_json::json!(false));
    assert_eq!(json["paid_amount"], serde_json::Value::Null);
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn engine_only_app_still_prints_config() {
    let app = App::new(load_config(None).unwrap(), None, as_of());

    let report = run(&app, &["config"]).await.unwrap();
    let text = output::render(&report, false).unwrap();

    assert!(text.starts_with("Tax year 2025"), "{text}");
    assert!(text.contains("Quarterly due dates: 2025-04-15, 2025-06-15, 2025-09-15, 2026-01-15"));
}

#[test]
fn missing_config_file_is_fatal() {
    let err = load_config(Some(fixture("no_such_config.toml").as_path())).unwrap_err();

    assert!(format!("{err:#}").contains("failed to load tax-year configuration"));
}
