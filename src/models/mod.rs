pub mod line;
pub mod record;
pub mod turn;
pub mod vocab;

pub use line::*;
pub use record::*;
pub use turn::*;
pub use vocab::*;
