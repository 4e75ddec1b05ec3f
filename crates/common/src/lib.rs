pub mod logging;
pub mod properties;
pub mod utils;
