//! HTTP surface for artbox
//!
//! [`RestApi`] serves the catalogue, uploads, model downloads and
//! recommendations over actix-web. Routes are registered by [`configure`]
//! so tests can mount them on a bare `App`.

pub mod populate;
pub mod rest;
pub mod upload;

pub use populate::{populate_from_folder, PopulateReport, IMAGE_EXTENSIONS};
pub use rest::{configure, ApiConfig, AppState, RestApi};
pub use upload::{UploadError, UploadForm, UploadLimits};
