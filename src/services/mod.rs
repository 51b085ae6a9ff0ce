pub mod health;
pub mod subscription;
