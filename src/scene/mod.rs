pub mod primitives;
pub mod scene;

pub use scene::Scene;
