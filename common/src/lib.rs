pub mod locale;
pub mod log;
pub mod protocol;
pub mod session;
pub mod turn;
