pub mod fundamental;
pub mod value;
