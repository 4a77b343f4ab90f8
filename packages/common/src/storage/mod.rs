mod digest;
mod error;
mod traits;

pub mod filesystem;

pub use digest::Digest;
pub use error::StorageError;
pub use traits::{BlobStore, BoxReader};
