//! CLI command implementations

pub mod activate;
pub mod config;
pub mod install;
pub mod partitions;
pub mod resolve;
pub mod serve;
pub mod status;

pub use activate::execute as activate;
pub use config::execute as config;
pub use install::execute as install;
pub use partitions::execute as partitions;
pub use resolve::execute as resolve;
pub use serve::execute as serve;
pub use status::execute as status;
