use std::fmt::{Display, Formatter};

use finscope_core::{
    CompanyInfo, Granularity, NoticeLevel, PriceSeries, PriceWindow, SourceError, StatementSet,
    Symbol, UtcDateTime,
};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::CommandResult;

/// Request identifier (UUID v4), one per rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub request_id: RequestId,
    pub source: &'static str,
    pub symbol: Symbol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<PriceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    pub latency_ms: u64,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportNotice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A product that failed to load.
#[derive(Debug, Clone, Serialize)]
pub struct ReportError {
    pub product: &'static str,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ReportError {
    fn new(product: &'static str, error: &SourceError) -> Self {
        Self {
            product,
            code: error.code(),
            message: error.message().to_owned(),
            retryable: error.retryable(),
        }
    }
}

/// JSON view of a [`CommandResult`]. Products that were not requested or
/// failed are omitted; failures are listed under `errors`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub meta: ReportMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<&'a PriceSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<&'a StatementSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<&'a CompanyInfo>,
    pub notices: Vec<ReportNotice>,
    pub errors: Vec<ReportError>,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a CommandResult, source: &'static str) -> Self {
        let mut errors = Vec::new();
        if let Some(Err(error)) = &result.price {
            errors.push(ReportError::new("price", error));
        }
        if let Some(Err(error)) = &result.statements {
            errors.push(ReportError::new("statements", error));
        }

        Self {
            meta: ReportMeta {
                request_id: RequestId::new_v4(),
                source,
                symbol: result.symbol.clone(),
                window: result.window,
                granularity: result.granularity,
                latency_ms: result.latency_ms,
                generated_at: UtcDateTime::now().format_rfc3339(),
            },
            price: result
                .price
                .as_ref()
                .and_then(|outcome| outcome.as_deref().ok()),
            statements: result
                .statements
                .as_ref()
                .and_then(|outcome| outcome.as_deref().ok()),
            company: result.company.as_deref(),
            notices: result
                .notices
                .iter()
                .map(|notice| ReportNotice {
                    level: notice.level(),
                    message: notice.message(),
                })
                .collect(),
            errors,
        }
    }
}
