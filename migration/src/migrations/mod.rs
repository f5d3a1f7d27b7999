pub mod m202601150001_create_users;
pub mod m202601150002_create_students;
pub mod m202601150003_create_events;
pub mod m202601150004_create_event_participants;
pub mod m202601150005_create_attendance_logs;
pub mod m202601150006_create_on_duty_requests;
pub mod m202601150007_create_on_duty_attendance;
