//! The `TableStore` trait.
//!
//! Implemented by storage backends (e.g. `pishne-store-sqlite`). A store
//! holds one layer per table and is read and written a whole layer at a
//! time; there is no locking or conflict detection.

use std::path::Path;

use crate::frame::Frame;

/// Abstraction over a multi-layer table container.
pub trait TableStore {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Names of the layers currently held.
  fn layers(&self) -> Result<Vec<String>, Self::Error>;

  /// Read a whole layer. Returns `None` if the layer does not exist.
  fn read_layer(&self, layer: &str) -> Result<Option<Frame>, Self::Error>;

  /// Replace a layer with `frame`, creating it if needed.
  fn write_layer(&self, layer: &str, frame: &Frame) -> Result<(), Self::Error>;

  /// The file backing this store, if any.
  fn location(&self) -> Option<&Path>;
}
