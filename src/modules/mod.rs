pub mod config;
pub mod error;
pub mod lark;
pub mod records;
pub mod sync;
pub mod transformer;
pub mod utility;
