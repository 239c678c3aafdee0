mod llbbox;
mod llpoint;

pub use llbbox::LLBBox;
pub use llpoint::LLPoint;
