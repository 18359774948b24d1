pub mod body;
pub mod cors;
pub mod responses;
pub mod router;
pub mod state;
pub mod submit;
pub mod upload_url;

pub use responses::{ApiError, ApiMessage, SuccessBody, json_error};
pub use state::AppState;
