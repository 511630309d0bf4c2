pub mod obj;

pub use obj::ObjMesh;
