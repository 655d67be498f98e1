pub mod coordinate;
pub mod crop;
pub mod environmental;
pub mod history;
pub mod recommendation;

pub use coordinate::*;
pub use crop::*;
pub use environmental::*;
pub use history::*;
pub use recommendation::*;
