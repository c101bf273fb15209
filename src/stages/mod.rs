pub mod stage0_parse;
pub mod stage1_classify;
pub mod stage2_persist;

pub use stage0_parse::*;
pub use stage1_classify::*;
pub use stage2_persist::*;
