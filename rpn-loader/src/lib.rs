//! Anchor target construction for region proposal network training.
//!
//! The crate turns an annotated image into the fixed-shape tensors consumed by
//! an RPN detector: the anchor lattice, the foreground and background anchor
//! labels, and the box regression targets.

mod common;

pub mod anchor;
pub mod assign;
pub mod config;
pub mod extractor;
pub mod overlap;
pub mod packer;
pub mod params;
pub mod provider;
pub mod sampler;
pub mod shape;
pub mod target;
pub mod transformer;

pub use anchor::*;
pub use assign::*;
pub use common::GroundTruth;
pub use config::*;
pub use extractor::*;
pub use overlap::*;
pub use packer::*;
pub use params::*;
pub use provider::*;
pub use sampler::*;
pub use shape::*;
pub use target::*;
pub use transformer::*;
