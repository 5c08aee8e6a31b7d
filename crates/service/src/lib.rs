pub mod service;

pub use service::{
    cancel_organize, get_session, load_settings, save_settings, start_organize, CancelResponse,
    OrganizeRequest, SessionSnapshot, SessionStatus,
};
