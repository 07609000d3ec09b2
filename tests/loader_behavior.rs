//! Behavior tests for the dashboard loader.
//!
//! These verify what a dashboard user sees for known, unknown and failing
//! symbols, and that the three products never take each other down.

use finscope_tests::*;

// =============================================================================
// Dashboard scenarios
// =============================================================================

#[tokio::test]
async fn when_known_symbol_is_loaded_all_three_products_are_populated() {
    // Given: A provider with data for AAPL
    let source = ScriptedSource::new();
    let (loader, _clock) = scripted_loader(&source);
    let request = DashboardRequest::parse("AAPL", Some("1y"), Some("annual")).expect("valid");

    // When: The dashboard is loaded
    let dashboard = loader.load_dashboard(request).await;

    // Then: Price history is non-empty and ordered by date
    let series = dashboard.price.as_ref().expect("price loads");
    assert_eq!(series.len(), 252);
    assert!(series
        .bars()
        .windows(2)
        .all(|pair| pair[0].ts < pair[1].ts));

    // Then: Each statement is a non-empty table indexed by fiscal year, newest first
    let statements = dashboard.statements.as_ref().expect("statements load");
    for table in statements.tables() {
        assert!(!table.is_empty(), "{} should have rows", table.kind);
        assert_eq!(table.periods(), scripted_periods(Granularity::Annual));
    }

    // Then: The company overview carries a real name and no notices are raised
    assert_eq!(
        dashboard.company.text(CompanyField::CompanyName),
        Some("AAPL Holdings Inc.")
    );
    assert!(dashboard.notices.is_empty(), "{:?}", dashboard.notices);
    assert!(!dashboard.has_failures());
}

#[tokio::test]
async fn when_unknown_symbol_is_loaded_user_sees_empty_products_and_notices() {
    // Given: A provider with no data for the symbol
    let source = ScriptedSource::new();
    let (loader, _clock) = scripted_loader(&source);
    let request = DashboardRequest::new(symbol("ZZZZINVALID"));

    // When: The dashboard is loaded
    let dashboard = loader.load_dashboard(request).await;

    // Then: Price and statements are empty successes, not failures
    assert!(dashboard.price.as_ref().expect("empty is ok").is_empty());
    assert!(dashboard.statements.as_ref().expect("empty is ok").is_empty());
    assert!(!dashboard.has_failures());

    // Then: Every company field falls back to N/A
    assert_eq!(dashboard.company.sourced_count(), 0);
    assert!(dashboard
        .company
        .iter()
        .all(|(_, state)| state.to_string() == "N/A"));

    // Then: The user is told there is no data
    assert_eq!(
        dashboard.notices,
        vec![
            Notice::NoPriceData,
            Notice::NoStatementData,
            Notice::CompanyDetailsLimited
        ]
    );
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn when_price_endpoint_fails_statements_and_company_still_render() {
    // Given: The price endpoint is rate limited
    let source = ScriptedSource::new();
    source.fail(
        Endpoint::Price,
        SourceError::rate_limited("yahoo rate limited the chart request"),
    );
    let (loader, _clock) = scripted_loader(&source);

    // When: The dashboard is loaded
    let dashboard = loader
        .load_dashboard(DashboardRequest::new(symbol("MSFT")))
        .await;

    // Then: The price failure surfaces as a structured error and a warning notice
    let error = dashboard.price.as_ref().expect_err("price fails");
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    assert!(dashboard.has_failures());
    assert_eq!(
        dashboard.notices,
        vec![Notice::PriceUnavailable {
            message: String::from("yahoo rate limited the chart request")
        }]
    );

    // Then: The other products are unaffected
    assert!(!dashboard.statements.as_ref().expect("statements load").is_empty());
    assert!(!dashboard.company.is_limited());
}

#[tokio::test]
async fn when_statements_fail_the_failure_is_not_cached() {
    // Given: The statements endpoint is briefly unavailable
    let source = ScriptedSource::new();
    source.fail(
        Endpoint::Statements,
        SourceError::unavailable("timeseries request timed out"),
    );
    let (loader, _clock) = scripted_loader(&source);
    let aapl = symbol("AAPL");

    // When: The first fetch fails and the endpoint then recovers
    let first = loader.fetch_statements(&aapl, Granularity::Quarterly).await;
    source.recover(Endpoint::Statements);
    let second = loader.fetch_statements(&aapl, Granularity::Quarterly).await;

    // Then: The retry reaches the provider and succeeds
    assert!(first.is_err());
    let set = second.expect("recovered");
    assert_eq!(
        set.income_statement.periods(),
        scripted_periods(Granularity::Quarterly)
    );
    assert_eq!(source.calls(Endpoint::Statements), 2);
}

#[tokio::test]
async fn when_every_endpoint_fails_the_dashboard_still_loads() {
    // Given: Every provider endpoint is down
    let source = ScriptedSource::new();
    for endpoint in [
        Endpoint::Price,
        Endpoint::Statements,
        Endpoint::FastInfo,
        Endpoint::FullInfo,
    ] {
        source.fail(endpoint, SourceError::unavailable("upstream down"));
    }
    let (loader, _clock) = scripted_loader(&source);

    // When: The dashboard is loaded
    let dashboard = loader
        .load_dashboard(DashboardRequest::new(symbol("AAPL")))
        .await;

    // Then: Price and statements report failures, company info degrades fully
    assert!(dashboard.price.is_err());
    assert!(dashboard.statements.is_err());
    assert_eq!(dashboard.company.sourced_count(), 0);
    assert_eq!(dashboard.company.iter().count(), CompanyField::ALL.len());
    assert_eq!(dashboard.notices.len(), 3);
}
