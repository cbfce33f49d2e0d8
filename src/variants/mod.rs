pub mod labels;
pub mod model;
pub mod parser;

pub use model::{OptionSlot, ParseOutcome, ParseTier, ParsedVariants};
pub use parser::{parse, parse_with_tier};
