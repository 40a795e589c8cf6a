pub mod assessment;
pub mod notification;
pub mod question;
