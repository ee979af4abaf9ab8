pub mod config;
pub mod dates;
pub mod derive;
pub mod error;
pub mod ids;
pub mod importer;
pub mod model;
pub mod notify;
pub mod repository;
pub mod session;
pub mod state;
pub mod storage;
