pub mod constants;
pub mod url_utils;
pub mod user_agents;

pub use constants::*;
pub use url_utils::{InvalidUrlError, origin_of, robots_path_of, sanitize_url};
pub use user_agents::UserAgentPool;
