//! Behavior tests for two-tier company overview degradation.
//!
//! Every combination of tier success and failure must yield all nine fields,
//! with unavailable fields shown as N/A instead of failing the overview.

use finscope_tests::*;

const FAST_FIELDS: [CompanyField; 4] = [
    CompanyField::MarketCap,
    CompanyField::CurrentPrice,
    CompanyField::YearHigh,
    CompanyField::YearLow,
];

const FULL_FIELDS: [CompanyField; 5] = [
    CompanyField::CompanyName,
    CompanyField::Sector,
    CompanyField::Industry,
    CompanyField::DividendYield,
    CompanyField::PeRatio,
];

fn assert_sourced_from(info: &CompanyInfo, fields: &[CompanyField], tier: InfoTier) {
    for field in fields {
        match info.get(*field) {
            FieldState::Sourced { tier: actual, .. } => {
                assert_eq!(*actual, tier, "{field:?} came from the wrong tier")
            }
            FieldState::Unavailable => panic!("{field:?} should be sourced"),
        }
    }
}

fn assert_unavailable(info: &CompanyInfo, fields: &[CompanyField]) {
    for field in fields {
        assert_eq!(
            info.get(*field),
            &FieldState::Unavailable,
            "{field:?} should be N/A"
        );
    }
}

#[tokio::test]
async fn when_both_tiers_succeed_every_field_is_sourced() {
    // Given: Both provider tiers answer
    let source = ScriptedSource::new();
    let (loader, _clock) = scripted_loader(&source);

    // When: Company info is fetched
    let info = loader.fetch_company_info(&symbol("AAPL")).await;

    // Then: All nine fields carry values from their own tier
    assert_eq!(info.sourced_count(), CompanyField::ALL.len());
    assert_sourced_from(&info, &FAST_FIELDS, InfoTier::Fast);
    assert_sourced_from(&info, &FULL_FIELDS, InfoTier::Full);
    assert_eq!(info.fast_tier, TierOutcome::Sourced);
    assert_eq!(info.full_tier, TierOutcome::Sourced);
    assert_eq!(info.number(CompanyField::PeRatio), Some(29.4));
}

#[tokio::test]
async fn when_fast_tier_fails_full_tier_fields_are_still_shown() {
    // Given: The quote endpoint is down but the profile endpoint answers
    let source = ScriptedSource::new();
    source.fail(Endpoint::FastInfo, SourceError::unavailable("quote endpoint down"));
    let (loader, _clock) = scripted_loader(&source);

    // When: Company info is fetched
    let info = loader.fetch_company_info(&symbol("AAPL")).await;

    // Then: Name, sector, industry, dividend yield and P/E are real
    assert_sourced_from(&info, &FULL_FIELDS, InfoTier::Full);
    assert_eq!(info.text(CompanyField::Sector), Some("Technology"));

    // Then: Market cap, price and the 52-week range fall back to N/A
    assert_unavailable(&info, &FAST_FIELDS);
    assert!(matches!(
        info.fast_tier,
        TierOutcome::Failed {
            kind: SourceErrorKind::Unavailable,
            ..
        }
    ));
    assert!(!info.is_limited());
}

#[tokio::test]
async fn when_full_tier_is_rate_limited_fast_fields_are_still_shown() {
    // Given: The profile endpoint answers 429
    let source = ScriptedSource::new();
    source.fail(
        Endpoint::FullInfo,
        SourceError::rate_limited("yahoo rate limited the quoteSummary request"),
    );
    let (loader, _clock) = scripted_loader(&source);

    // When: Company info is fetched
    let info = loader.fetch_company_info(&symbol("MSFT")).await;

    // Then: The quote-derived fields are real and the rest are N/A
    assert_sourced_from(&info, &FAST_FIELDS, InfoTier::Fast);
    assert_unavailable(&info, &FULL_FIELDS);
    assert_eq!(info.number(CompanyField::MarketCap), Some(2_900_000_000_000.0));

    // Then: The overview is flagged as limited with the rate limit recorded
    assert!(info.is_limited());
    assert_eq!(
        info.full_tier,
        TierOutcome::Failed {
            kind: SourceErrorKind::RateLimited,
            message: String::from("yahoo rate limited the quoteSummary request"),
        }
    );
}

#[tokio::test]
async fn when_both_tiers_fail_all_fields_are_present_as_na() {
    // Given: Both tiers fail
    let source = ScriptedSource::new();
    source.fail(Endpoint::FastInfo, SourceError::internal("malformed quote payload"));
    source.fail(Endpoint::FullInfo, SourceError::unavailable("connection reset"));
    let (loader, _clock) = scripted_loader(&source);

    // When: Company info is fetched
    let info = loader.fetch_company_info(&symbol("AAPL")).await;

    // Then: All nine fields are still present, each N/A
    let fields: Vec<CompanyField> = info.iter().map(|(field, _)| field).collect();
    assert_eq!(fields, CompanyField::ALL.to_vec());
    assert_eq!(info.sourced_count(), 0);
    assert!(info.fast_tier.is_failed());
    assert!(info.full_tier.is_failed());
}

#[tokio::test]
async fn degraded_overview_serializes_with_field_provenance() {
    // Given: An overview with only the fast tier available
    let source = ScriptedSource::new();
    source.fail(Endpoint::FullInfo, SourceError::rate_limited("too many requests"));
    let (loader, _clock) = scripted_loader(&source);
    let info = loader.fetch_company_info(&symbol("AAPL")).await;

    // When: It is serialized for the JSON report
    let value = serde_json::to_value(info.as_ref()).expect("serializes");

    // Then: Each field records its state and the failed tier is explained
    assert_eq!(value["fields"]["market_cap"]["state"], "sourced");
    assert_eq!(value["fields"]["market_cap"]["tier"], "fast");
    assert_eq!(value["fields"]["company_name"]["state"], "unavailable");
    assert_eq!(value["full_tier"]["status"], "failed");
    assert_eq!(value["full_tier"]["kind"], "rate_limited");
}
