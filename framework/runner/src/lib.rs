mod cli;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod shutdown;
mod types;

pub use cli::parse_agent_behaviour;

pub mod prelude {
    pub use crate::cli::{ReporterOpt, ScenarioCli};
    pub use crate::context::{RunnerContext, UserValuesConstraint, VirtualUserContext};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder};
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::run::run;
    pub use crate::types::LoadDriverResult;

    pub use load_driver_core::prelude::*;
    pub use load_driver_instruments::prelude::*;
}
