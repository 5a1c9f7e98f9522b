pub mod error;
pub mod message;
pub mod upload;

#[cfg(test)]
pub mod test_utils;

pub use error::*;
