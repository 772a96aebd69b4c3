pub mod check;
pub mod elements;
pub mod event_ops;
pub mod issue_ops;
