pub mod cache;
pub mod espn;
pub mod provider;

pub use cache::{FeedCache, NoopCache, TtlCache};
pub use espn::EspnScoreboard;
pub use provider::{EventTiming, ScoreboardSource};
