pub mod portal;

pub use portal::{
    AccessTier, ApproveParams, ApproveResponse, ChallengeResponse, RegisterRequest,
    RegisterResponse,
};
