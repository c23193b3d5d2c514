pub mod common;
pub mod contacts;
pub mod history;
pub mod sync;
