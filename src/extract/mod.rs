pub mod patterns;
pub mod rescue;
pub mod subject;
pub mod table;
pub mod title;

pub use rescue::RescuePass;
pub use subject::SubjectExtractor;
pub use table::reconstruct_rows;
pub use title::{correct_title, TitleCorrection};
