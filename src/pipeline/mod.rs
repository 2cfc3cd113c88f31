pub mod bulk;
pub mod duplicate;
pub mod geo;
pub mod import;
pub mod metrics;
pub mod parse;
