//! Storage key derivation.

/// Prefix of every recurring job record key.
pub const JOB_KEY_PREFIX: &str = "recurring-daterange-job";

/// Registry set holding every recurring job id.
pub const JOB_SET: &str = "recurring-daterange-jobs";

/// Record key for a job id.
pub fn job_key(id: &str) -> String {
    format!("{JOB_KEY_PREFIX}:{id}")
}

/// Lock resource guarding the whole registry.
pub fn registry_lock() -> String {
    format!("{JOB_SET}:lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(job_key("daily-report"), "recurring-daterange-job:daily-report");
        assert_eq!(registry_lock(), "recurring-daterange-jobs:lock");
    }
}
