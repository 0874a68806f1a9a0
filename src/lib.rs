pub mod adherence; // Dose adherence tracker
pub mod api; // HTTP surface
pub mod catalog; // Drug catalog CSV seeding
pub mod config;
pub mod db;
pub mod ddi; // DDI detection pipeline
pub mod models;
