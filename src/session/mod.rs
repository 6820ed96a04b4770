pub mod controller;
pub mod report;
pub mod scheduler;
