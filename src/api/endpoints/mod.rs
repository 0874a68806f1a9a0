pub mod alternatives;
pub mod health;
pub mod interactions;
pub mod medications;
