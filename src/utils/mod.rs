pub mod filename;
pub mod hash;
pub mod html;
pub mod jwt;
