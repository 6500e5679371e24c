//! Resource compiler/linker for a console memory-card save image.
//!
//! The crate re-encodes embedded text, graphics, and binary regions of a
//! fixed-layout save-file image according to externally supplied manifests,
//! while preserving the console's structural constraints: block/frame
//! geometry, pointer tables, fixed-size slots, and the declared block
//! count in the title frame.

pub mod error;
pub mod gfx;
pub mod layout;
pub mod linker;
pub mod manifest;
pub mod packer;
pub mod patch;
pub mod save;
pub mod text;

pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use save::{BaseMode, SaveImage, TitleMetadata};
