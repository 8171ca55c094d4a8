// SmartMark services
// Services talk to the outside world (auth service, table service, favicon service)
// or provide infrastructure (crypto, settings) for the managers.

pub mod auth_client;
pub mod crypto_service;
pub mod favicon;
pub mod rest_client;
pub mod settings_engine;
