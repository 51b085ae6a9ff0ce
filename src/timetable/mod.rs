pub mod aggregate;
pub mod day_range;
pub mod format;
pub mod render;

pub use aggregate::{aggregate, Lesson};
pub use day_range::DayRange;
pub use format::{format_range, Prefs};
pub use render::render_schedule;
