pub mod classifier;
pub mod content;
pub mod media;
pub mod session;
pub mod view;
