/// Singleton site settings live in one key/value table. These are the keys
/// the site reads and writes.
pub mod keys {
    pub const COVER_IMAGE: &str = "cover_image";
    pub const PROFILE_AVATAR: &str = "profile_avatar";
    pub const PROFILE_NAME: &str = "profile_name";
    pub const PROFILE_BIO: &str = "profile_bio";
    pub const FLOWER_COUNT: &str = "flower_count";
    pub const SECURITY_QUESTION: &str = "security_question";
    pub const SECURITY_ANSWER: &str = "security_answer";
}

/// Key/value configuration store. Writes are upserts and the last write wins.
///
/// Implemented by the SQLite database; the image pipeline only depends on
/// this trait so it can be exercised against an in-memory map.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn upsert(&self, key: &str, value: &str) -> anyhow::Result<()>;
}
