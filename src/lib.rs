pub mod config;
pub mod db;
pub mod error;
pub mod server;

pub use db::{DbActorHandle, DbSettings};
pub use error::StoreError;
