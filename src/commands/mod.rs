pub mod index;
pub mod init;
