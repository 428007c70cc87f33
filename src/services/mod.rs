pub mod application_service;
pub mod event_service;
pub mod job_service;
pub mod mail_service;
pub mod pipeline_service;
pub mod settings_service;
pub mod user_service;
