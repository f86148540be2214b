pub mod detection;
pub mod health;
