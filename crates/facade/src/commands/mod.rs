pub mod generate;
pub mod init;
pub mod manifest;
pub mod watch;
