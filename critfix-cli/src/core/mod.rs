pub mod error;
pub mod output;

pub use error::{CritFixError, Result};
pub use output::{OutputFormat, OutputWriter};
