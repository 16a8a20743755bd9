pub mod reading;
pub mod store;

pub use reading::{LastPriceTable, PriceReading, format_change, percent_change};
pub use store::{MAX_ROWS, PriceLogStore, StoreError};
