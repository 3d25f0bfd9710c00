//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{BillingConfig, Error, ReportConfig, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The parameters for deriving billing periods from meter readings.
    pub billing_config: BillingConfig,

    /// The config that controls how the report page is displayed.
    pub report_config: ReportConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will validate `billing_config` and initialize the
    /// database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns [Error::NoSolarSource] if the billing config does not name a
    /// solar meter, or an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        billing_config: BillingConfig,
        report_config: ReportConfig,
    ) -> Result<Self, Error> {
        billing_config.validate()?;
        initialize(&db_connection)?;

        Ok(Self {
            billing_config,
            report_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
