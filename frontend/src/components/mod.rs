pub mod fields;
pub mod form;
pub mod header;
pub mod results;
pub mod utils;
