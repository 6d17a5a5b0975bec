/// Scene groups
pub mod group;
/// Material, texture and physics library records and catalogs
pub mod library;
/// Patches (polygons) and their vertices
pub mod patch;
/// The decoded DLP scene document
pub mod scene;
/// Vector and color value types
pub mod types;
