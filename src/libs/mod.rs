pub mod contact;
pub mod error;
pub mod io;
pub mod seq;
