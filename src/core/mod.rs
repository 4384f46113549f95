pub mod error;
pub mod types;

pub use error::{EntityError, Result};
pub use types::{ClientInstanceId, EntityDescriptor, EntityIdentity};
