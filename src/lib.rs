pub mod ast;
pub mod config;
pub mod error;
pub mod tailor;

pub use config::TailorConfig;
pub use error::TailorError;
pub use tailor::{translate, translate_sql, SqlServerTailor, Tailor};
