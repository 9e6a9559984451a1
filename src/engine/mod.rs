pub mod assignment;
pub mod capacity;
pub mod fare;
pub mod progress;
pub mod wallet;
