pub mod clock;
pub mod electricity;
pub mod lenient;
pub mod models;
pub mod pagination;
pub mod panel;
