pub mod fallible;
pub mod timestamps;
