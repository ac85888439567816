pub mod coordinate;
pub mod session;
pub mod trip;
