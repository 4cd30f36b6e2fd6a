pub mod database;
pub mod notifier;
pub mod repository;
