//! Built-in destinations.

pub mod salesforce;

pub use salesforce::SalesforceDestination;
