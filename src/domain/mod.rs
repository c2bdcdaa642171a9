pub mod errors;
pub mod events;
pub mod order;
pub mod order_number;
pub mod ports;
pub mod stats;
pub mod transition;
