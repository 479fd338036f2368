use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error(
        "no feasible assignment: {adults} adults and {children} children cannot fill \
         {teams} teams with at least {min_occupancy} people each"
    )]
    NoFeasibleAssignment {
        adults: u32,
        children: u32,
        teams: u32,
        min_occupancy: u32,
    },
    #[error("search too large: {people} people across {teams} teams exceed the search budget")]
    SearchTooLarge { people: u64, teams: u32 },
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),
}

impl PricingError {
    pub(crate) fn invalid(reason: impl Into<String>) -> PricingError {
        PricingError::InvalidArgument {
            reason: reason.into(),
        }
    }
}
