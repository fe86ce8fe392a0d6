#![forbid(unsafe_code)]

pub mod advisory;
pub mod availability;
pub mod countdown;
pub mod model;
pub mod time;

pub use time::Clock;
