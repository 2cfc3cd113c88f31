pub mod activity;
pub mod import;
