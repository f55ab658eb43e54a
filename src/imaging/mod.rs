pub mod preprocess;
pub mod quadrant;

pub use preprocess::{preprocess, PreparedImage};
pub use quadrant::{detect_year_range, split_quadrants, Quadrant, QuadrantPosition, YearRange};
