pub mod predict;
pub mod schema;
pub mod status;
