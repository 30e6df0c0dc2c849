use sha2::{Digest, Sha256};
use sqlx::types::Uuid;
use time::OffsetDateTime;

use crate::db::Certificate;

/// Mints completion certificates. The serial is an identifier, not a secret:
/// a SHA-256 digest over learner, course and issuance instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateIssuer;

impl CertificateIssuer {
    pub fn new() -> Self {
        Self
    }

    pub fn issue(&self, learner_id: Uuid, course_id: Uuid, now: OffsetDateTime) -> Certificate {
        Certificate {
            course_id,
            issued_at: now,
            serial: serial_for(learner_id, course_id, now),
        }
    }
}

/// Lower-case hex, 64 characters.
pub fn serial_for(learner_id: Uuid, course_id: Uuid, issued_at: OffsetDateTime) -> String {
    let mut hasher = Sha256::new();
    hasher.update(learner_id.to_string().as_bytes());
    hasher.update(course_id.to_string().as_bytes());
    hasher.update(issued_at.unix_timestamp_nanos().to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn serial_is_64_lowercase_hex() {
        let serial = serial_for(Uuid::new_v4(), Uuid::new_v4(), OffsetDateTime::now_utc());
        assert_eq!(serial.len(), 64);
        assert!(serial.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn serial_is_deterministic_for_identical_inputs() {
        let learner = Uuid::new_v4();
        let course = Uuid::new_v4();
        let at = datetime!(2025-03-01 12:00:00 UTC);
        assert_eq!(serial_for(learner, course, at), serial_for(learner, course, at));
    }

    #[test]
    fn serial_changes_with_any_input() {
        let learner = Uuid::new_v4();
        let course = Uuid::new_v4();
        let at = datetime!(2025-03-01 12:00:00 UTC);
        let base = serial_for(learner, course, at);

        assert_ne!(base, serial_for(Uuid::new_v4(), course, at));
        assert_ne!(base, serial_for(learner, Uuid::new_v4(), at));
        assert_ne!(base, serial_for(learner, course, datetime!(2025-03-01 12:00:00.000000001 UTC)));
    }

    #[test]
    fn issue_stamps_course_and_time() {
        let course = Uuid::new_v4();
        let at = datetime!(2025-06-15 08:30:00 UTC);
        let certificate = CertificateIssuer::new().issue(Uuid::new_v4(), course, at);
        assert_eq!(certificate.course_id, course);
        assert_eq!(certificate.issued_at, at);
        assert_eq!(certificate.serial.len(), 64);
    }
}
