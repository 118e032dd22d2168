pub mod errors;
pub mod fs;
pub mod status;
