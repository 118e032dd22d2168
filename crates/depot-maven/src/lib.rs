pub mod cache;
pub mod descriptor;
pub mod remote;
pub mod source;
pub mod transport;
