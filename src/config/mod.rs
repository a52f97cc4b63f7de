pub mod bank;
pub mod cooperative;
pub mod loader;
pub mod server;
pub mod store;

pub use bank::BankDisplayConfig;
pub use cooperative::CooperativeConfig;
pub use loader::AppConfig;
pub use server::ServerConfig;
pub use store::StoreConfig;
