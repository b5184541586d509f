// Library root
// -----------
// The binary (`main.rs`) wires these modules together; everything that
// can be tested without a terminal or a network lives here.
//
// Module responsibilities:
// - `api`: the gateway client over the remote identity-management API,
//   plus the `ManagementApi` trait describing the remote calls.
// - `http`: `reqwest` implementation of `ManagementApi`.
// - `workflow`: the interactive select / review / assign wizard.
// - `report`: text rendering for the workflow.
// - `ui`: the `dialoguer` terminal used by the binary.
// - `config`, `token`, `email`, `error`: supporting pieces.
pub mod api;
pub mod config;
pub mod email;
pub mod error;
pub mod http;
pub mod report;
pub mod token;
pub mod ui;
pub mod workflow;

pub use error::{Error, RemoteApiError, Result};
