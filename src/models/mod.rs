pub mod classification;
pub mod message;
pub mod record;

pub use classification::*;
pub use message::*;
pub use record::*;
