pub mod dates;
pub mod macros;
pub mod timeline;

pub use dates::*;
pub use timeline::*;
