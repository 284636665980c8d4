//! The agent decision pipeline: classification, verification, composition,
//! and dispatch.

pub mod actions;
pub mod classifier;
pub mod composer;
pub mod dispatcher;
pub mod types;
pub mod verifier;

pub use actions::{ActionCategory, ActionTemplates};
pub use classifier::IntentClassifier;
pub use composer::ResponseComposer;
pub use dispatcher::{AgentDispatcher, ResponseObserver};
pub use types::{
    AccessResult, AccessTier, Action, ActionMenu, ActionStyle, AgentResponse, Intent, IntentKind,
    ResponseMeta,
};
pub use verifier::{AccessVerifier, CacheStats};
