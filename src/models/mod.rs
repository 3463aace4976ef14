pub mod drawing;
pub mod user;
