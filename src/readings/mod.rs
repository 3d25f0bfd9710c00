//! Meter readings and daily solar production records.
//!
//! A meter reading records the grid meter's cumulative consumption and
//! injection totals on the day it was taken, and closes the billing period
//! that ends on that day. Solar production is recorded per day and summed
//! over each period when the report is derived.

mod meter;
mod solar;

pub use meter::{
    MeterReading, create_meter_reading, create_meter_reading_endpoint, create_meter_reading_table,
    delete_meter_reading_endpoint, get_all_meter_readings, get_edit_reading_page,
    get_new_reading_page, get_readings_page, update_meter_reading_endpoint,
};
pub use solar::{
    SolarReading, create_solar_period_endpoint, create_solar_reading,
    create_solar_reading_endpoint, create_solar_reading_table, delete_solar_reading_endpoint,
    get_all_solar_readings, get_edit_solar_page, get_new_solar_page, get_new_solar_period_page,
    get_solar_page, update_solar_reading_endpoint,
};
