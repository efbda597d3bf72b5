pub mod web_search;

pub use web_search::{WebSearchTool, WEB_SEARCH_TOOL_NAME};
