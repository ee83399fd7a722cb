pub mod audit;
pub mod classify;
pub mod collect;
pub mod generate;

pub use audit::*;
pub use classify::*;
pub use collect::*;
pub use generate::*;
