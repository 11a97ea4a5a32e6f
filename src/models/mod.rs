pub mod analytics;
pub mod application;
pub mod directory;
pub mod document;
pub mod interview;
pub mod note;
pub mod stage;
