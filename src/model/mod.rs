pub mod config;
pub mod elements;
pub mod event;
pub mod issue;
pub mod project;
pub mod table;

pub use config::*;
pub use elements::*;
pub use event::*;
pub use issue::*;
pub use project::*;
pub use table::*;
