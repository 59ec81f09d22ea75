mod dashboard;
mod scan;
mod store;
mod transcript;

pub use dashboard::*;
pub use scan::*;
pub use store::*;
pub use transcript::*;
