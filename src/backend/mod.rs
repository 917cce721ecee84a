//! Generic backend contracts and the registration protocol
//!
//! A backend plug-in provides an [`Accessor`] and optionally a [`DataOriginObserver`] for
//! its identifier type, and registers its data origins with a [`Registry`]. The registry
//! owns the backend's [`DataOriginMapper`], which the dispatcher routes requests to.

pub mod accessor;
pub mod mapper;
pub mod observer;
pub mod registry;

pub use accessor::Accessor;
pub use mapper::DataOriginMapper;
pub use observer::{CacheUpdater, DataOriginObserver};
pub use registry::{OriginState, Registry};
