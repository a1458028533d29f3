//! Command implementations.

pub mod action;
pub mod run;

pub use self::action::execute_action;
pub use self::run::execute_run;
