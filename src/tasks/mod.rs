pub mod entry;
pub mod spec;
pub mod task;
pub mod task_fn;

pub use entry::TaskEntry;
pub use spec::{Scope, StartupPolicy, TaskSpec};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
