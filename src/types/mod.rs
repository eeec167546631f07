//! Domain data model shared by providers, the engine and persistence.

mod auth;
mod booking;
mod chain;
mod location;
mod schedule;
mod session;

pub use auth::{AuthHandle, ChainUser, Credentials};
pub use booking::{ActivityId, RecurringBookingConfig};
pub use chain::{ChainId, ProviderKind};
pub use location::{Location, LocationId, LocationKey, LocationTable};
pub use schedule::{ScheduleClass, Slots};
pub use session::{LiveBooking, Session, SessionStatus};
