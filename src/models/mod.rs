pub mod enums;
pub mod pill;
pub mod recognition;
pub mod record;

pub use enums::*;
pub use pill::*;
pub use recognition::*;
pub use record::*;
