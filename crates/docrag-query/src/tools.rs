//! Model-callable tools and the user directory behind them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docrag_core::{StoreError, ToolRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A tool call the router knows how to execute.
///
/// Closed on purpose: a model asking for anything not listed here gets a
/// user-visible "unsupported" reply instead of reaching arbitrary code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    /// Find or register a user by email
    AuthorizeUser { email: String },
    /// Look up an existing user's profile
    GetUserProfile { email: String },
}

#[derive(Deserialize)]
struct EmailArgs {
    email: String,
}

impl ToolInvocation {
    /// Decode a model-issued request; `None` for unknown names or arguments
    /// that do not fit the declared schema.
    pub fn decode(request: &ToolRequest) -> Option<Self> {
        let args: EmailArgs = serde_json::from_value(request.arguments.clone()).ok()?;
        match request.name.as_str() {
            "authorize_user" => Some(Self::AuthorizeUser { email: args.email }),
            "get_user_profile" => Some(Self::GetUserProfile { email: args.email }),
            _ => None,
        }
    }

    /// Function declarations advertised to the chat model.
    pub fn declarations() -> serde_json::Value {
        serde_json::json!([
            {
                "name": "authorize_user",
                "description": "Authorize a user by email, registering them if they are new.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string", "description": "The user's email address" }
                    },
                    "required": ["email"]
                }
            },
            {
                "name": "get_user_profile",
                "description": "Fetch the profile of an existing user by email.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string", "description": "The user's email address" }
                    },
                    "required": ["email"]
                }
            }
        ])
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of an authorization call.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizedUser {
    pub profile: UserProfile,
    /// Whether this call created the user
    pub newly_registered: bool,
}

/// Backing store for the user tools.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by email, registering them first if unknown
    async fn authorize(&self, email: &str) -> Result<AuthorizedUser, StoreError>;

    /// Look up an existing user
    async fn profile(&self, email: &str) -> Result<Option<UserProfile>, StoreError>;
}

/// In-memory directory; the display name defaults to the email local part.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn authorize(&self, email: &str) -> Result<AuthorizedUser, StoreError> {
        let mut users = self.users.write().await;
        if let Some(profile) = users.get(email) {
            return Ok(AuthorizedUser {
                profile: profile.clone(),
                newly_registered: false,
            });
        }

        let name = email.split('@').next().unwrap_or(email).to_string();
        let profile = UserProfile {
            name,
            email: email.to_string(),
            joined_at: Utc::now(),
        };
        users.insert(email.to_string(), profile.clone());
        Ok(AuthorizedUser {
            profile,
            newly_registered: true,
        })
    }

    async fn profile(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }
}
