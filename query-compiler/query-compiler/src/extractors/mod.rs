mod filters;
mod query_arguments;

pub(crate) use filters::*;
pub(crate) use query_arguments::*;

pub use query_arguments::offset_to_cursor;
