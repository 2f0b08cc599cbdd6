//! # crm-query
//!
//! CRM data access for the assistant.
//!
//! - [`Authenticator`]: password-grant login producing a [`CrmSession`]
//! - [`CrmDataService`]: runs SOQL and returns raw records, following paging
//! - [`flatten_records`]: drops record metadata and promotes relationship fields
//! - [`QueryExecutor`]: ties the two together into a [`crm_types::TabularResult`]

pub mod auth;
pub mod client;
pub mod error;
pub mod executor;
pub mod flatten;
pub mod mock;
pub mod session;

pub use auth::{Authenticator, SalesforceAuthenticator};
pub use client::{CrmDataService, Record, SalesforceClient};
pub use error::{AuthError, QueryError};
pub use executor::QueryExecutor;
pub use flatten::{flatten_record, flatten_records, METADATA_FIELD};
pub use mock::{MockAuthenticator, MockCrmService};
pub use session::{CrmSession, Credentials};
