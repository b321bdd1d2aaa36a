use spyglass_db::{Database, DbConfig};

pub fn test_database() -> Database {
    let config = DbConfig::from_env();
    Database::from_config(&config).expect("Failed to create database handle")
}
