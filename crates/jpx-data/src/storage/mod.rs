//! 저장소 모듈.

pub mod artifact;

pub use artifact::ArtifactStore;
