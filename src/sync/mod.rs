pub mod refresh;

pub use refresh::{RefreshController, RefreshEvent, RefreshTrigger, RefreshView, TreeSnapshot};
