pub mod grade;
pub mod import;
pub mod init;
pub mod rank;
pub mod template;
pub mod validate;
