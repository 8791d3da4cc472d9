pub mod command;
pub mod pillar;
pub mod record;
pub mod session;
