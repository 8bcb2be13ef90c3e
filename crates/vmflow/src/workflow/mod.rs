//! Steps of the VM sample, composed by the commands

pub mod listing;
pub mod machines;
pub mod operations;
pub mod provision;
pub mod teardown;

pub use machines::CreatedMachine;
pub use provision::Foundation;
