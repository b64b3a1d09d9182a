pub mod collection;
pub mod event;
pub mod notification;
pub mod outcome;
pub mod result;
pub mod task;
pub mod user;

pub use collection::Collection;
pub use event::{ChangeAction, ChangeEvent, EntityKind, WireEvent};
pub use notification::Notification;
pub use outcome::ExecutionOutcome;
pub use result::TaskResult;
pub use task::Task;
pub use user::User;
