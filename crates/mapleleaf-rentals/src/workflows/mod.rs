pub mod chat;
pub mod inquiry;
