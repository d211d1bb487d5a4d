pub mod catalog;
pub mod video;
