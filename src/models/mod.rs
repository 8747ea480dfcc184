pub mod deal;
pub mod forecast;

pub use deal::Deal;
pub use forecast::{ForecastAggregate, ForecastRecord};
