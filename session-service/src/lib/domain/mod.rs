pub mod errors;
pub mod patch;
pub mod session;
pub mod user;
pub mod validation;
