//! Filesystem side of the server: sandboxed reads for GET and the upload
//! store for POST.

pub mod resolver;
pub mod serve;
pub mod upload;

pub use resolver::{PathResolver, Rejection, ResolvedFile};
pub use serve::serve_file;
pub use upload::UploadStore;
