pub mod events;
pub mod mailer;
pub mod repository;
pub mod runner;

pub use events::EventPublisher;
pub use mailer::Mailer;
pub use repository::{
    NotificationRepository, ResultRepository, TaskRepository, TokenValidator, UserRepository,
};
pub use runner::CodeRunner;
