pub mod align;
pub mod analyze;
pub mod normalize;
pub mod pairs;

pub use align::*;
pub use analyze::*;
pub use normalize::*;
pub use pairs::*;
