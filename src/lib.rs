pub mod collectibles;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod grid;
pub mod logging;
pub mod maze;
pub mod rng;
pub mod server_protocol;
pub mod tiles;
pub mod types;
