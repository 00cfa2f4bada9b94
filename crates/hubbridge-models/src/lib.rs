#![deny(missing_docs)]

//! # Hubbridge Models
//!
//! Plain data types shared by every hubbridge crate.
//!
//! ## Data flow
//!
//! ```text
//! "HostName=…;SharedAccessKeyName=…;SharedAccessKey=…"
//!        │  IotHubConnectionString::from_str
//!        ▼
//!   Credential ──────────────┐
//!                            ├──► EventHubConnectionString
//!   RedirectInfo (discovered)┘      "Endpoint=sb://…/;EntityPath=…;…"
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`connection_string`] | Input/output connection strings and [`Credential`] |
//! | [`redirect`] | [`RedirectInfo`] harvested from a link redirect |
//! | [`error`] | [`ModelError`] |

pub mod connection_string;
pub mod error;
pub mod redirect;

// Re-export all public types at crate root for convenience.
pub use connection_string::*;
pub use error::*;
pub use redirect::*;
