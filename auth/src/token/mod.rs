pub mod opaque;

pub use opaque::OpaqueToken;
pub use opaque::TokenDigest;
