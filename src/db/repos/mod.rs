pub mod compressed;
pub mod detailed;
