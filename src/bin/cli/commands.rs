pub mod category;
pub mod cycle;
pub mod wisdom;
