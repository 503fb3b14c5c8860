pub mod list;
pub mod model;

pub use list::BlockList;
pub use model::{BlockRule, RuleKind};
