// src/identity.rs
use crate::db::UserProfile;

/// Source of account-level profile data that the local profile may lack.
pub trait IdentityProvider: Send + Sync {
    /// Image URL of the signed-in account, used when the stored profile has none.
    fn fallback_image_url(&self, user_id: &str) -> Option<String>;
}

/// No account data available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn fallback_image_url(&self, _user_id: &str) -> Option<String> {
        None
    }
}

/// Serves one URL for every user, e.g. the `fallback_profile_image` config entry.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    image_url: Option<String>,
}

impl StaticIdentity {
    pub fn new(image_url: Option<String>) -> Self {
        Self { image_url }
    }
}

impl IdentityProvider for StaticIdentity {
    fn fallback_image_url(&self, _user_id: &str) -> Option<String> {
        self.image_url.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileImage {
    Url(String),
    DefaultIcon,
}

/// Stored URL if non-blank, then the provider's, then the default icon.
pub fn resolve_profile_image(user: &UserProfile, identity: &dyn IdentityProvider) -> ProfileImage {
    user.profile_image_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .or_else(|| {
            identity
                .fallback_image_url(&user.user_id)
                .filter(|url| !url.trim().is_empty())
        })
        .map_or(ProfileImage::DefaultIcon, ProfileImage::Url)
}
