pub mod bootstrap;
pub mod dispatch;
pub mod health;
