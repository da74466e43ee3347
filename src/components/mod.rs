pub mod colors;
pub mod layers;
pub mod tools;
