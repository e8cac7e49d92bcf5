mod attendance;
mod certificate;
mod enrollment;
mod training;

pub use attendance::*;
pub use certificate::*;
pub use enrollment::*;
pub use training::*;
