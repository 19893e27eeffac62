pub mod comparison;
pub mod countdown;
pub mod events;
pub mod model;
pub mod submission;
