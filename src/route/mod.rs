pub mod docs;
pub mod submit;
