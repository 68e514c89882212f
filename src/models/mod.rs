pub mod bike;
pub mod booking;
pub mod location;
pub mod user;
pub mod window;

pub use bike::{Bike, RateSheet};
pub use booking::{Booking, BookingStatus, PickupType, RentalType};
pub use location::Location;
pub use user::User;
pub use window::TimeWindow;
