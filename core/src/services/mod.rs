//! Business services containing domain logic and use cases.

pub mod token;

// Re-export commonly used types
pub use token::{
    ClaimsCodec, ExpiryReaper, ExpiryReaperConfig, ReapResult, RetryPolicy, RevocationService,
    SigningKeys, TokenIssuer, TokenService, TokenServiceConfig, TokenValidator,
};
