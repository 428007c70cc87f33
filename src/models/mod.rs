pub mod application;
pub mod field;
pub mod job;
pub mod pipeline;
pub mod stage;
pub mod user;
