//! Market data access port trait.

use chrono::NaiveDate;

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Bar;

/// Source of daily OHLCV bars. Returns plain bars rather than a series so
/// the engine owns column bookkeeping; implementations must return bars in
/// ascending date order, inclusive of both window edges where data exists.
pub trait BrokerPort {
    fn get_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StratsimError>;
}
