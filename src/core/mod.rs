mod keeper;
mod queue;
mod runner;
mod worker;

pub use keeper::Keeper;
