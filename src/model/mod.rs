//! Types that represent the data exchanged with the server, such as `Category` and `Outcome`.
pub(crate) mod amount;
mod category;
mod outcome;
mod statistic;
mod user;

pub use amount::{Amount, AmountError};
pub use category::Category;
pub use outcome::{CategoryRef, CreatedOutcome, Outcome, OutcomeFilters};
pub use statistic::OutcomeStatistic;
pub use user::{ProfileUpdate, SignIn, SignUp, User};
