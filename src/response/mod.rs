pub mod error;
pub(crate) mod geometry;
pub(crate) mod parse;
pub mod query_response;
