//! The tools offered to the model.

mod clock;
mod debt;

pub use clock::{Clock, CurrentDateTool, SystemClock};
pub use debt::{DebtTool, FETCH_FAILED_MESSAGE};
