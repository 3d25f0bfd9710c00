//! Database initialization for the application.

use rusqlite::Connection;

use crate::{
    Error,
    readings::{create_meter_reading_table, create_solar_reading_table},
};

/// Create the tables for the application's domain models if they do not exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    create_meter_reading_table(connection)?;
    create_solar_reading_table(connection)?;

    Ok(())
}
