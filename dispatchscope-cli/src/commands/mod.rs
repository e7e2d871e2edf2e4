pub mod common;
pub mod compare;
pub mod context;
pub mod replay;
