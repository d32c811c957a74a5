pub mod dashboard;
pub mod feedback;
pub mod setup;
pub mod ui;
