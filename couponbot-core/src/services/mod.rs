pub mod command_parser;
pub mod command_service;
pub mod redemption;
pub mod registry;
pub mod reporter;

pub use command_service::CommandService;
pub use registry::Registry;
