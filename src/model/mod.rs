pub mod catalog;
pub mod movie;
