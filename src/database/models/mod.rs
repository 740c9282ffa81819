pub mod chart;
pub mod user;

pub use chart::{Chart, ChartOwner, ChartWithOwner, NewChart, DEFAULT_CHART_TITLE, DEFAULT_CHART_TYPE};
pub use user::{NewUser, UpdateOutcome, User, UserChanges, UserProfile};
