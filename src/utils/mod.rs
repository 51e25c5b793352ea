pub mod files;
pub mod jwt;
pub mod patch;
pub mod username;
