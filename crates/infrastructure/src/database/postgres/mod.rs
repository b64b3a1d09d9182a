pub mod notification_repository;
pub mod result_repository;
pub mod task_repository;
pub mod user_repository;

pub use notification_repository::PostgresNotificationRepository;
pub use result_repository::PostgresResultRepository;
pub use task_repository::PostgresTaskRepository;
pub use user_repository::PostgresUserRepository;
