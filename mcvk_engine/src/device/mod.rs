/// Backend seam: handles, plain data and the GraphicsBackend trait

mod backend;
mod handles;
mod owned;
mod types;

#[cfg(test)]
pub(crate) mod mock_backend;

pub use backend::GraphicsBackend;
pub use handles::*;
pub use owned::{DeviceObject, UniqueHandle};
pub use types::*;
