pub mod auth;
pub mod classes;
pub mod core;
pub mod portal;
pub mod results;
pub mod students;
pub mod subjects;
pub mod transfer;
pub mod users;
