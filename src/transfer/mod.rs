//! Moving asset bytes from the device to the host.
//!
//! Two readers are provided. [`BufferedReader`] fetches the whole asset up
//! front and serves reads from memory. [`ChunkedReader`] asks the device for
//! each window as it is read and never learns the total size; a short read
//! marks the end of the stream.

mod buffered;
mod chunked;
mod download;
mod reader;
#[cfg(test)]
mod tests;

pub use buffered::BufferedReader;
pub use chunked::ChunkedReader;
pub use download::{copy_to_file, download_to_file, DEFAULT_WINDOW_SIZE};
pub use reader::{AssetReader, ReadOutcome};
