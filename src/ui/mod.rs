mod about;
mod help;
mod pane;
mod prompt;
mod recipients;
mod send;
mod sidebar;
mod smtp;

pub use about::*;
pub use help::*;
pub use pane::*;
pub use prompt::*;
pub use recipients::*;
pub use send::*;
pub use sidebar::*;
pub use smtp::*;
