pub mod checkins;
pub mod courts;
pub mod health;
pub mod rsvps;
