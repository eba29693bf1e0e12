// tyr-service/src/utils/mod.rs
pub mod access_control;
pub mod guard;
pub mod membership;
pub mod membership_store;

pub use access_control::{Capability, TaskCapability};
pub use guard::AccessGuard;
pub use identity::{IdentityProvider, RequestContext, TokenIdentity};
pub use membership_store::{MembershipStore, MEMBERSHIP_STORE};

// Identity seam. Authentication mechanics (token validation, sessions,
// password handling) live in the hosting service; the core only needs an
// authenticated Actor per request.
pub mod identity {
    use crate::models::{Actor, ServiceError};
    use std::collections::HashMap;

    // Opaque request-scoped credential handed over by the transport layer
    #[derive(Debug, Clone, Default)]
    pub struct RequestContext {
        pub credential: Option<String>,
    }

    impl RequestContext {
        pub fn with_credential(credential: impl Into<String>) -> Self {
            Self {
                credential: Some(credential.into()),
            }
        }

        pub fn anonymous() -> Self {
            Self::default()
        }
    }

    // The external identity provider: resolves a request to an actor or
    // fails with Unauthorized
    pub trait IdentityProvider {
        fn current_actor(&self, ctx: &RequestContext) -> Result<Actor, ServiceError>;
    }

    // Credential -> actor map. The hosting service registers actors here
    // after validating their tokens; tests seed it directly.
    #[derive(Default)]
    pub struct TokenIdentity {
        actors: HashMap<String, Actor>,
    }

    impl TokenIdentity {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn register(&mut self, credential: impl Into<String>, actor: Actor) {
            self.actors.insert(credential.into(), actor);
        }
    }

    impl IdentityProvider for TokenIdentity {
        fn current_actor(&self, ctx: &RequestContext) -> Result<Actor, ServiceError> {
            let credential = ctx
                .credential
                .as_deref()
                .ok_or(ServiceError::Unauthorized)?;
            self.actors
                .get(credential)
                .cloned()
                .ok_or(ServiceError::Unauthorized)
        }
    }
}
