mod error;
mod flatten;
pub mod format;
mod import;
pub mod scene;
mod vertex;

pub use error::{ FlattenError, ImportError, };
pub use flatten::{ DEFAULT_MAX_DEPTH, FlattenOptions, FlattenStats, TransformMode, flatten, flatten_scene, };
pub use format::VertexFormat;
pub use import::{ FileImporter, SceneImporter, };
pub use scene::{ ImportFlags, Scene, SceneNode, SceneSummary, };
pub use vertex::FlatVertex;
