//! Derivatives and the assets they are built from.
//!
//! A [`Derivative`](derivative::Derivative) either adopts a complete model
//! or combines a bare geometry with texture images into a single mesh. The
//! loaded result is a small renderable node tree (nodes, meshes, PBR
//! materials, textures and geometry) which is released through
//! [`ResourceRelease`](release::ResourceRelease) when the derivative is
//! disposed. Loaders for glTF, OBJ and common image formats live in
//! [`loader`], together with the asset loader component that resolves URLs
//! and tracks loading state.

pub mod asset;
pub mod bounds;
pub mod derivative;
pub mod derivative_list;
pub mod geometry;
pub mod index;
/// Model, geometry, texture and document loaders
pub mod loader;
pub mod material;
pub mod mesh;
pub mod node;
pub mod release;
pub mod texture;
