//! Rate-limit buckets.
//!
//! A bucket names an endpoint class and carries its default limit and
//! window. Keys are prefixed with the bucket name so two buckets can never
//! count against each other.

use std::time::Duration;

use crate::domain::identity::CallerIdentity;

/// A named rate-limit bucket: limit per window for one endpoint class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    name: &'static str,
    limit: u32,
    window: Duration,
}

impl Bucket {
    /// A bucket with a caller-chosen name, limit, and window.
    pub fn custom(name: &'static str, limit: u32, window: Duration) -> Self {
        Self {
            name,
            limit,
            window,
        }
    }

    /// Chat completions: 30 requests per minute.
    pub fn chat() -> Self {
        Self::custom("chat", 30, Duration::from_secs(60))
    }

    /// General API: 60 requests per minute.
    pub fn api() -> Self {
        Self::custom("api", 60, Duration::from_secs(60))
    }

    /// v2 API: 100 requests per minute.
    pub fn api_v2() -> Self {
        Self::custom("api-v2", 100, Duration::from_secs(60))
    }

    /// Voice cloning: 1 request per 10 minutes.
    pub fn voice_clone() -> Self {
        Self::custom("voice-clone", 1, Duration::from_secs(600))
    }

    /// Speech-to-text: 30 requests per minute.
    pub fn stt() -> Self {
        Self::custom("stt", 30, Duration::from_secs(60))
    }

    /// Contact sync: 6 requests per hour.
    pub fn sync() -> Self {
        Self::custom("sync", 6, Duration::from_secs(3600))
    }

    /// The bucket name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maximum admitted requests per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in milliseconds.
    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }

    /// The counter key for one identity in this bucket.
    pub fn key_for(&self, identity: &CallerIdentity) -> String {
        format!("{}:{}", self.name, identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(Bucket::chat().limit(), 30);
        assert_eq!(Bucket::chat().window(), Duration::from_secs(60));
        assert_eq!(Bucket::api().limit(), 60);
        assert_eq!(Bucket::api_v2().limit(), 100);
        assert_eq!(Bucket::voice_clone().limit(), 1);
        assert_eq!(Bucket::voice_clone().window(), Duration::from_secs(600));
        assert_eq!(Bucket::stt().limit(), 30);
        assert_eq!(Bucket::sync().limit(), 6);
        assert_eq!(Bucket::sync().window(), Duration::from_secs(3600));
    }

    #[test]
    fn test_keys_are_namespaced_per_bucket() {
        let identity = CallerIdentity::user("u1");
        assert_eq!(Bucket::chat().key_for(&identity), "chat:user:u1");
        assert_eq!(Bucket::api().key_for(&identity), "api:user:u1");
        assert_ne!(
            Bucket::chat().key_for(&identity),
            Bucket::api().key_for(&identity)
        );
    }

    #[test]
    fn test_custom_bucket() {
        let bucket = Bucket::custom("export", 2, Duration::from_secs(300));
        assert_eq!(bucket.name(), "export");
        assert_eq!(bucket.window_ms(), 300_000);
    }
}
