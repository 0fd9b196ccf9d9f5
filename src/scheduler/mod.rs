pub mod lane;
pub mod parallel;
pub mod single;
pub mod splitter;

pub use lane::{encode_lane, EncodedLane, LaneEncoder};
pub use parallel::BlockLaneScheduler;
pub use single::SingleThreadedEncoder;
pub use splitter::BlockSplitter;
