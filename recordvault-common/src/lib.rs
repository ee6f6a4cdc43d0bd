//! RecordVault Common Types
//!
//! Shared types used by the backend and by anything speaking its HTTP API.

pub mod api;
pub mod record;
pub mod user;

pub use api::{
    AckResponse, AdminUserResponse, AdminUsersResponse, CreateRecordRequest,
    CreateRecordResponse, ErrorResponse, LoginRequest, LoginResponse, RecordsResponse,
    RegisterRequest, RegisterResponse, UpdateRecordRequest,
};
pub use record::Record;
pub use user::{PublicUser, UserSummary, UserWithRecords};
