pub mod canonicalize;
pub mod demo;
pub mod inspect;
pub mod verify;
