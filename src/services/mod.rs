pub mod naming;
pub mod sniff;
pub mod upload_service;
