//! Backend plug-ins built on the generic registration contracts

pub mod files;

pub use files::{FileAccessor, FileBackend, FileObserver};
