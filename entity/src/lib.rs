pub mod campaign;
pub mod country;
pub mod donor;
pub mod mode;
pub mod schema;
pub mod subscription;
pub mod transaction;

pub use mode::Mode;
