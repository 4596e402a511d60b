pub mod devices;
pub mod enroll;
pub mod health;
pub mod helpers;
pub mod organizations;
