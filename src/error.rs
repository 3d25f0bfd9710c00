//! Defines the app level error type and its conversion to rendered HTML pages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{html::error_view, not_found::get_404_not_found_response};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// No solar source was named in the billing configuration.
    ///
    /// The report tracks production for a single named solar meter, so the
    /// server refuses to start until one is configured. This is checked once
    /// at startup and never retried.
    #[error("no solar source is configured")]
    NoSolarSource,

    /// The billing period length fell outside the supported range.
    #[error("billing period length of {0} days is not between 1 and 365")]
    InvalidBillingPeriodDays(u32),

    /// A date in the future was used for a meter or solar reading.
    ///
    /// Readings record meter values that have already been observed,
    /// therefore future dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A meter reading already exists for the given period end date.
    #[error("a meter reading already exists for that end date")]
    DuplicateReadingDate,

    /// A solar production entry already exists for the given date.
    #[error("a solar production entry already exists for that date")]
    DuplicateSolarDate,

    /// A solar period's start date came after its end date.
    #[error("the period start date {0} is after the end date {1}")]
    InvalidSolarPeriod(Date, Date),

    /// Tried to delete a meter reading that does not exist.
    #[error("tried to delete a meter reading that is not in the database")]
    DeleteMissingReading,

    /// Tried to delete a solar production entry that does not exist.
    #[error("tried to delete a solar entry that is not in the database")]
    DeleteMissingSolarEntry,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("meter_reading.end_date") =>
            {
                Error::DuplicateReadingDate
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("solar_reading.date") =>
            {
                Error::DuplicateSolarDate
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::FutureDate(date) => error_view(
                StatusCode::BAD_REQUEST,
                "Invalid Date",
                &format!("{date} is a date in the future, which is not allowed."),
                "Change the date to today or earlier and try again.",
            ),
            Error::DuplicateReadingDate => error_view(
                StatusCode::BAD_REQUEST,
                "Duplicate Reading",
                "A meter reading already exists for that end date.",
                "Delete the existing reading first, or pick a different end date.",
            ),
            Error::DuplicateSolarDate => error_view(
                StatusCode::BAD_REQUEST,
                "Duplicate Solar Entry",
                "A solar production entry already exists for that date.",
                "Delete the existing entry first, or pick a different date.",
            ),
            Error::InvalidSolarPeriod(start, end) => error_view(
                StatusCode::BAD_REQUEST,
                "Invalid Period",
                &format!("The period start date {start} is after the end date {end}."),
                "Swap the dates so the period starts before it ends and try again.",
            ),
            Error::DeleteMissingReading => error_view(
                StatusCode::NOT_FOUND,
                "Could Not Delete Reading",
                "The meter reading could not be found.",
                "Try refreshing the page to see if it has already been deleted.",
            ),
            Error::DeleteMissingSolarEntry => error_view(
                StatusCode::NOT_FOUND,
                "Could Not Delete Solar Entry",
                "The solar production entry could not be found.",
                "Try refreshing the page to see if it has already been deleted.",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_view(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs.",
                )
            }
        }
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use super::Error;

    #[test]
    fn maps_no_rows_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn maps_unique_end_date_violation_to_duplicate_reading() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute(
                "CREATE TABLE meter_reading (id INTEGER PRIMARY KEY, end_date TEXT NOT NULL UNIQUE)",
                (),
            )
            .unwrap();
        connection
            .execute("INSERT INTO meter_reading (end_date) VALUES ('2024-01-31')", ())
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO meter_reading (end_date) VALUES ('2024-01-31')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateReadingDate);
    }

    #[test]
    fn future_date_renders_bad_request() {
        let response = Error::FutureDate(date!(2200 - 01 - 01)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_renders_404() {
        let response = Error::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
