pub mod db;
pub mod error;
pub mod options;
pub mod queries;
mod transfer;
