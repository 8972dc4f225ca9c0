//! System property areas: mapping, brute-force lookup and the checks built
//! on top of them.

pub mod area;
pub mod checker;
pub mod error;

pub use area::PropArea;
pub use checker::PropertyChecker;
pub use error::AreaError;
