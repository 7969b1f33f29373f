pub mod job;
pub mod lot;
pub mod reservation;
pub mod user;

pub use job::*;
pub use lot::*;
pub use reservation::*;
pub use user::*;
