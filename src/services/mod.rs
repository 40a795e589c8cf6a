pub mod assessment_service;
pub mod judge_service;
pub mod notification_service;
