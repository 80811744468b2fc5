pub mod cancel;
pub mod domain;
pub mod error;
pub mod query;
pub mod services;
