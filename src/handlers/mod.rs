pub mod health;
pub mod portal;
