pub mod booking;
pub mod planner;

pub use booking::BookingService;
