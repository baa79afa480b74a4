pub mod athlete;
pub mod coach;
