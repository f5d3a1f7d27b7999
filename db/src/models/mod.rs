pub mod attendance_log;
pub mod event;
pub mod event_participant;
pub mod on_duty_attendance;
pub mod on_duty_request;
pub mod student;
pub mod user;
