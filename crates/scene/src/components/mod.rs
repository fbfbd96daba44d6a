pub mod geometry;
pub mod properties;
pub mod style;

pub use geometry::*;
pub use properties::*;
pub use style::*;
