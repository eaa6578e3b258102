pub mod db;
pub mod models;
mod tables;
mod users;

pub use db::{DatabaseError, MetadataDb};
pub use tables::*;
