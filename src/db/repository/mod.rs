pub mod drug;
pub mod medication;

pub use drug::*;
pub use medication::*;
