pub mod interval;
pub mod time;


pub use interval::*;
pub use time::*;
