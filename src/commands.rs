pub mod serve;
pub mod verify_env;
