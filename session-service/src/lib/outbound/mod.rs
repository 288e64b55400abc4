pub mod credentials;
pub mod notifier;
pub mod repositories;
