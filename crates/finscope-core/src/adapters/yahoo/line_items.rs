//! Statement line items requested from the fundamentals timeseries endpoint.
//!
//! Yahoo names each series `{annual|quarterly}{Key}`; the label is the column
//! header shown for it.

use crate::{Granularity, StatementKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineItem {
    pub key: &'static str,
    pub label: &'static str,
}

const fn item(key: &'static str, label: &'static str) -> LineItem {
    LineItem { key, label }
}

const BALANCE_SHEET: &[LineItem] = &[
    item("TotalAssets", "Total Assets"),
    item("CurrentAssets", "Current Assets"),
    item("CashAndCashEquivalents", "Cash And Cash Equivalents"),
    item("AccountsReceivable", "Accounts Receivable"),
    item("Inventory", "Inventory"),
    item("NetPPE", "Net PPE"),
    item("Goodwill", "Goodwill"),
    item("TotalLiabilitiesNetMinorityInterest", "Total Liabilities Net Minority Interest"),
    item("CurrentLiabilities", "Current Liabilities"),
    item("LongTermDebt", "Long Term Debt"),
    item("TotalDebt", "Total Debt"),
    item("StockholdersEquity", "Stockholders Equity"),
    item("RetainedEarnings", "Retained Earnings"),
    item("OrdinarySharesNumber", "Ordinary Shares Number"),
];

const INCOME_STATEMENT: &[LineItem] = &[
    item("TotalRevenue", "Total Revenue"),
    item("CostOfRevenue", "Cost Of Revenue"),
    item("GrossProfit", "Gross Profit"),
    item("ResearchAndDevelopment", "Research And Development"),
    item("SellingGeneralAndAdministration", "Selling General And Administration"),
    item("OperatingExpense", "Operating Expense"),
    item("OperatingIncome", "Operating Income"),
    item("InterestExpense", "Interest Expense"),
    item("PretaxIncome", "Pretax Income"),
    item("TaxProvision", "Tax Provision"),
    item("NetIncome", "Net Income"),
    item("EBITDA", "EBITDA"),
    item("BasicEPS", "Basic EPS"),
    item("DilutedEPS", "Diluted EPS"),
];

const CASH_FLOW: &[LineItem] = &[
    item("OperatingCashFlow", "Operating Cash Flow"),
    item("DepreciationAndAmortization", "Depreciation And Amortization"),
    item("ChangeInWorkingCapital", "Change In Working Capital"),
    item("InvestingCashFlow", "Investing Cash Flow"),
    item("CapitalExpenditure", "Capital Expenditure"),
    item("FinancingCashFlow", "Financing Cash Flow"),
    item("RepurchaseOfCapitalStock", "Repurchase Of Capital Stock"),
    item("CashDividendsPaid", "Cash Dividends Paid"),
    item("FreeCashFlow", "Free Cash Flow"),
    item("EndCashPosition", "End Cash Position"),
];

pub(crate) fn line_items(kind: StatementKind) -> &'static [LineItem] {
    match kind {
        StatementKind::BalanceSheet => BALANCE_SHEET,
        StatementKind::IncomeStatement => INCOME_STATEMENT,
        StatementKind::CashFlow => CASH_FLOW,
    }
}

pub(crate) fn series_prefix(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Annual => "annual",
        Granularity::Quarterly => "quarterly",
    }
}

/// Comma-separated `type` query value covering all three statements.
pub(crate) fn series_types(granularity: Granularity) -> String {
    let prefix = series_prefix(granularity);
    StatementKind::ALL
        .into_iter()
        .flat_map(|kind| line_items(kind).iter())
        .map(|item| format!("{prefix}{}", item.key))
        .collect::<Vec<_>>()
        .join(",")
}
