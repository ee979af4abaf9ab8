mod task;

pub use task::{Filter, RemoteTask, Task};
