mod cluster;
mod normalize;
mod region;
mod sentiment;
pub(crate) mod util;

pub use cluster::Cluster;
pub use normalize::Normalize;
pub use region::Region;
pub use sentiment::Sentiment;
