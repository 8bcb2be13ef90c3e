pub mod down;
pub mod list;
pub mod ops;
pub mod run;
pub mod status;
pub mod up;
