//! Prices a party of adults and children split across independently billed
//! teams, and finds the cheapest and dearest way to do the split.
//!
//! ```
//! use team_pricing::{optimize, GroupComposition, PricingParameters};
//!
//! let params = PricingParameters::default();
//! let result = optimize(GroupComposition::new(4, 0), 1, &params).unwrap();
//! assert_eq!(result.min_price, 60);
//! assert_eq!(result.max_price, 60);
//! ```

pub mod error;
pub mod extremes;
pub mod model;
pub mod optimizer;
pub mod partition;
pub mod pricing;
pub mod settings;
pub mod table;

pub use error::PricingError;
pub use model::group::{Count, GroupComposition, TeamAssignment, TeamComposition};
pub use model::result::{OptimizationResult, TeamQuote};
pub use model::tariff::{Price, PricingParameters, ThresholdScope};
pub use optimizer::{even_assignment, optimize, quote, Optimizer, Strategy};
pub use partition::{partition_count, partitions, Partitions};
pub use pricing::{price, PricingRule, Tariff};
pub use settings::{LogFormat, LoggingSettings, SearchSettings, Settings};
