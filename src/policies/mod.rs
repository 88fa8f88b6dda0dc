pub mod daily;
pub mod periodic;
pub mod schedule;

pub use daily::Daily;
pub use periodic::Periodic;
pub use schedule::{Schedule, Window};
