#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/sigag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod batch;
pub use batch::WriteBatch;

mod epoch;
pub use epoch::{EpochRecord, EpochStore, META_PREFIX};

mod error;
pub use error::StorageError;

mod file;
pub use file::FileKv;

mod kv;
pub use kv::KvStore;

mod memory;
pub use memory::MemoryKv;
