pub mod images;
pub mod migrate;
pub mod session;
