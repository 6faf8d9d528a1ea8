mod images;
mod resolver;
mod storage;
mod types;

pub use images::{FsImageStore, ImageStore};
pub use resolver::DesignResolver;
pub use storage::{DesignStore, LibsqlDesignStore};
pub use types::Design;
