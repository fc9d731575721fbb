pub mod blob;
pub mod clock;
pub mod replica;

pub use blob::{BlobFetch, ReplicaLocation, S3BlobClient};
pub use clock::{Clock, SystemClock};
pub use replica::ReplicaCache;
