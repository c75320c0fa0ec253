//! # Overview
//!
//! Crate for creating and updating the materials of the shaders that Shade generates.
//!
//! Shade writes every shader into its own directory together with a `Graph.json` file that
//! describes the nodes of the shader graph and the images that the graph samples. The
//! [`Synchronizer`] reads the graph and makes sure that a material exists for the shader in
//! which every texture node is bound to its image. It also configures how the images are
//! imported (wrap mode, filter mode and whether the image is a normal map).
//!
//! ## Example:
//!
//! **Asset Directory:**
//!
//! ```text
//! Shade/
//! ├─ Surface/
//! │  ├─ Foo/
//! │  │  ├─ Foo.shader        declares Shader "Shade/Foo"
//! │  │  ├─ Foo.shader.meta   default textures of the shader
//! │  │  ├─ Graph.json
//! │  │  ├─ Base Color.png
//! │  │  ├─ Base Color.png.meta
//! │  ├─ Foo.mat              generated material
//! ```
//!
//! # Components
//!
//! All assets are accessed through the [`AssetStore`]. The [`FileSystem`] stores them in a
//! directory and the [`MemoryStore`] keeps them in memory. The [`Synchronizer`] combines the
//! [`descriptor`], [`PropertyName`], [`texture`] and [`import_settings`] modules to bring the
//! material of a shader up to date. Running it again on an unchanged graph changes nothing.

mod asset_store;
mod common;
mod file_system;
mod property_name;
mod synchronizer;

pub mod descriptor;
pub mod import_settings;
pub mod material;
pub mod shader;
pub mod texture;

pub use asset_store::*;
pub use common::{AssetKey, Error, Result, IMPORT_SETTINGS_EXTENSION};
pub use file_system::*;
pub use property_name::*;
pub use shader::Shader;
pub use synchronizer::*;
