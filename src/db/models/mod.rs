pub mod activity_event;
pub mod profile;

pub use activity_event::{ActivityEvent, NewActivityEvent};
pub use profile::{Profile, TimeBudget};
