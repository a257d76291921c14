//! # Reelshelf Core
//!
//! Storage and thumbnail pipeline for a flat-directory video library.
//!
//! ## Overview
//!
//! A library is a single directory holding source videos named by id, a JSON
//! sidecar with editable titles, and derived thumbnail artifacts whose names
//! follow from the id. There is no index: every listing is computed from the
//! directory at call time.
//!
//! - [`library`]: path rules, id assignment and atomic writes
//! - [`metadata`]: the sidecar file and its single-writer owner
//! - [`resolver`]: cover > extracted frame > slate thumbnail resolution
//! - [`slate`]: deterministic SVG placeholder covers
//! - [`frames`]: frame extraction through an external decoder
//! - [`upload`], [`cover`], [`lifecycle`]: the write paths
//! - [`service`]: one handle over all of the above

#![allow(missing_docs)]

pub mod cover;
pub mod error;
pub mod frames;
pub mod library;
pub mod lifecycle;
pub mod metadata;
pub mod resolver;
pub mod service;
pub mod slate;
pub mod upload;

pub use error::{LibraryError, Result};
pub use frames::{
    ExtractionFailed, FfmpegFrameSource, FrameSettings, FrameSource, UnavailableFrameSource,
    probe_frame_source,
};
pub use library::{ArtifactKind, LibraryLayout};
pub use resolver::{AssetResolver, VideoAsset};
pub use service::{LibraryService, LibrarySettings};
pub use slate::{SlateGenerator, Theme};
