//! # Enhancer Content
//!
//! The content-script engine: decides whether a page may be touched, finds
//! eligible text fields, runs the per-field affordance state machine and
//! answers liveness and replacement requests from the popup.
//!
//! The engine runs against the host traits in `enhancer-protocols`. An
//! in-memory page host built from HTML fixtures lives in [`page`].

pub mod affordance;
pub mod classifier;
mod debug;
mod error;
pub mod page;
pub mod policy;
pub mod scanner;
mod script;

pub use affordance::{Decision, Visibility};
pub use classifier::{InputKind, TextSurface};
pub use debug::{AffordanceDebug, DebugSnapshot};
pub use error::ContentError;
pub use page::{MemoryPage, PageChannels};
pub use policy::{BlockList, DomainPolicy, LocationInfo};
pub use scanner::{Scanner, ScannerConfig};
pub use script::{ContentChannels, ContentHost, ContentScript};
