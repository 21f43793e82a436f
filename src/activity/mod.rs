mod logger;
mod page_view;
mod store;
mod time_budget;

pub use logger::ActivityLogger;
pub use page_view::PageViewTracker;
pub use store::ActivityStore;
pub use time_budget::{TimeBudgetTracker, UsageReport};

#[cfg(test)]
pub(crate) use store::testing;
