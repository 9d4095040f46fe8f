// Feature cube persistence
// MessagePack + LZ4 compression with versioning and integrity checks

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{
    decompress_and_deserialize, load_features, save_features, serialize_and_compress,
    StoredFeatures,
};

pub const STORE_VERSION: u32 = 1;
