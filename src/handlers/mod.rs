//! One handler per subcommand.

pub mod extract;
pub mod fetch;
pub mod regenerate;
pub mod run;
