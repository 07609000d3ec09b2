//! # Domain Models
//!
//! Canonical dashboard types with validation at construction time.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Trimmed, upper-cased ticker symbol |
//! | [`PriceWindow`] | Span of price history (1mo .. max) |
//! | [`Granularity`] | Annual or quarterly statements |
//! | [`PriceBar`] | Daily OHLCV row |
//! | [`PriceSeries`] | Date-ordered price history for one symbol |
//! | [`StatementTable`] | One statement, periods as rows and line items as columns |
//! | [`StatementSet`] | The three statements at one granularity |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ```rust,ignore
//! use finscope_core::{PriceBar, UtcDateTime, ValidationError};
//!
//! let ts = UtcDateTime::parse("2024-01-02T00:00:00Z")?;
//! let bar = PriceBar::new(ts, 185.0, 188.4, 183.9, 185.6, None, Some(82_488_700))?;
//!
//! // high < low is rejected
//! let invalid = PriceBar::new(ts, 185.0, 180.0, 188.0, 185.6, None, None);
//! assert!(matches!(invalid, Err(ValidationError::InvalidBarRange)));
//! ```

mod granularity;
mod price;
mod statement;
mod symbol;
mod timestamp;
mod window;

pub use granularity::Granularity;
pub use price::{PriceBar, PriceSeries};
pub use statement::{StatementKind, StatementRow, StatementSet, StatementTable};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
pub use window::PriceWindow;
