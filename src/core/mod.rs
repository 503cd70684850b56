pub mod export;
pub mod filter;
pub mod table;

pub use filter::LogFilter;
pub use table::LogTable;
