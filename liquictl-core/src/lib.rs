pub mod command;
pub mod config;
pub mod error;
pub mod invoke;
pub mod value;

pub use command::{
    CalculateCheckSumAttrs, FutureRollbackCountSqlAttrs, GenerateChangeLogAttrs, LiquibaseCommand,
    UpdateAttrs,
};
pub use config::LiquibaseConfig;
pub use error::{InvokeError, Result};
pub use invoke::{Invoker, Liquibase, MockInvoker, RealInvoker, ToolExit};
pub use value::AttrValue;
