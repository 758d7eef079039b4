pub mod init;
pub mod restore;
pub mod run;
