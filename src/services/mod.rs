//! One module per backend REST resource. Each is a set of thin typed calls
//! over [`crate::client::ApiClient`].

pub mod identity;
pub mod hackathons;
pub mod rounds;
pub mod teams;
pub mod boards;
pub mod sponsorships;
pub mod devices;
pub mod submissions;
pub mod judging;
pub mod notifications;
pub mod chat;

pub const IDENTITY: &str = "/identity-service/api/v1";
pub const HACKATHON: &str = "/hackathon-service/api/v1";
pub const SUBMISSION: &str = "/submission-service/api/v1";
pub const COMMUNICATION: &str = "/communication-service/api/v1";

/// Backend services reachable through the `/api/{service}/...` proxy.
pub const PROXIED_SERVICES: [&str; 4] = [
    "identity-service",
    "hackathon-service",
    "submission-service",
    "communication-service",
];
