/// Byte cursor and record layout primitives
pub mod data;
/// Error definitions
pub mod error;
/// OBJ/MTL, log and CSV writers plus per-file processing
pub mod export;
/// Mesh extraction from decoded scenes
pub mod mesh;
/// DLP scene and library record types
pub mod models;

pub use error::{DlpError, DlpResult};
pub use mesh::extract::MeshExtractor;
pub use models::scene::SceneDocument;
