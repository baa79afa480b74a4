pub mod athlete;
pub mod coach;
pub mod common;
