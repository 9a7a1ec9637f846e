pub mod events;
pub mod repos;
pub mod tasks;
pub mod workers;

pub use events::*;
pub use repos::*;
pub use tasks::*;
pub use workers::*;
