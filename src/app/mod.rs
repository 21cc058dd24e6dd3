// Application layer - Use case interactors

pub mod container;
pub mod queue_interactor;
pub mod record_interactor;

// Re-export interactors
pub use container::{AppContainer, ContainerOptions, DefaultAppContainer};
pub use queue_interactor::QueueInteractor;
pub use record_interactor::{RecordInteractor, RecordOutcome};
