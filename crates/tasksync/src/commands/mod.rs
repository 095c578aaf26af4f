//! Command implementations that do more than wire library calls together.

pub mod init;
