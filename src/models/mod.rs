pub mod attribute;
pub mod entry;
pub mod query;
pub mod result;

pub use attribute::*;
pub use entry::*;
pub use query::*;
pub use result::*;
