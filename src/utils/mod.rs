pub mod identity;
pub mod time;
