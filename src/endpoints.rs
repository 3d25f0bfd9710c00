//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/readings/{reading_id}', use [format_endpoint].

/// The root route which redirects to the report page.
pub const ROOT: &str = "/";
/// The landing page showing the billing report and charts.
pub const REPORT_VIEW: &str = "/report";
/// The page listing the recorded meter readings.
pub const READINGS_VIEW: &str = "/readings";
/// The page for entering a new meter reading.
pub const NEW_READING_VIEW: &str = "/readings/new";
/// The page for editing an existing meter reading.
pub const EDIT_READING_VIEW: &str = "/readings/{reading_id}/edit";
/// The page listing the recorded daily solar production.
pub const SOLAR_VIEW: &str = "/solar";
/// The page for entering a new solar production entry.
pub const NEW_SOLAR_VIEW: &str = "/solar/new";
/// The page for entering a period's solar production total.
pub const NEW_SOLAR_PERIOD_VIEW: &str = "/solar/period";
/// The page for editing an existing solar production entry.
pub const EDIT_SOLAR_VIEW: &str = "/solar/{entry_id}/edit";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a meter reading.
pub const READINGS_API: &str = "/api/readings";
/// The route to update a meter reading.
pub const UPDATE_READING: &str = "/api/readings/{reading_id}";
/// The route to delete a meter reading.
///
/// Registered as a POST route so the delete button works as a plain HTML form.
pub const DELETE_READING: &str = "/api/readings/{reading_id}/delete";
/// The route to create a solar production entry.
pub const SOLAR_API: &str = "/api/solar";
/// The route to spread a period's solar production total across its days.
pub const SOLAR_PERIOD_API: &str = "/api/solar/period";
/// The route to update a solar production entry.
pub const UPDATE_SOLAR: &str = "/api/solar/{entry_id}";
/// The route to delete a solar production entry.
///
/// Registered as a POST route so the delete button works as a plain HTML form.
pub const DELETE_SOLAR: &str = "/api/solar/{entry_id}/delete";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/readings/{reading_id}',
/// '{reading_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
