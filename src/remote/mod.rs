pub mod tasks_api;

pub use tasks_api::{GoogleTasksSource, RemoteError, RemoteTaskSource};
