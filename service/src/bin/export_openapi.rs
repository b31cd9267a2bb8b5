//! Export the `OpenAPI` schema as JSON for the staff dashboard's API client.
//!
//! Usage: `cargo run --bin export_openapi > openapi.json`

#![allow(clippy::print_stdout)]

use tcn_directory_api::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), serde_json::Error> {
    print!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
