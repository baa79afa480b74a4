pub mod athlete;
pub mod coach;

pub use athlete::{Athlete, NewAthlete};
pub use coach::Coach;
