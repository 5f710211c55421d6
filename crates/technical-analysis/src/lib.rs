pub mod extrema;
pub mod indicator_set;
pub mod indicators;


pub use extrema::*;
pub use indicator_set::*;
pub use indicators::*;
