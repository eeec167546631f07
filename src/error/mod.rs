mod auth;
mod booking;
mod slotbot;

pub use auth::AuthenticationError;
pub use booking::BookingError;
pub use slotbot::SlotbotError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
