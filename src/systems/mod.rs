pub mod batch;
pub mod export;
pub mod grid;
pub mod interaction;
pub mod layout;
pub mod ui;
