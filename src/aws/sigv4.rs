//! SigV4 date and scope formatting for browser POST policies. Key derivation
//! and the signature itself come from `aws-sigv4`.

use std::time::SystemTime;

use aws_sigv4::sign::v4;
use chrono::{DateTime, Utc};

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// `YYYYMMDDTHHMMSSZ`
pub fn amz_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// `YYYYMMDD`
pub fn short_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d").to_string()
}

pub fn credential_scope(at: DateTime<Utc>, region: &str, service: &str) -> String {
    format!("{}/{region}/{service}/aws4_request", short_date(at))
}

/// Hex signature of `string_to_sign` under the per-day signing key.
pub fn sign_hex(
    secret_access_key: &str,
    at: DateTime<Utc>,
    region: &str,
    service: &str,
    string_to_sign: &str,
) -> String {
    let key = v4::generate_signing_key(secret_access_key, SystemTime::from(at), region, service);
    v4::calculate_signature(key, string_to_sign.as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    // Published example from the AWS SigV4 documentation.
    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    #[test]
    fn signing_key_matches_aws_example() {
        let at = Utc.with_ymd_and_hms(2012, 2, 15, 0, 0, 0).unwrap();
        let key =
            v4::generate_signing_key(EXAMPLE_SECRET, SystemTime::from(at), "us-east-1", "iam");
        assert_eq!(
            hex::encode(key.as_ref()),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn dates_are_formatted_for_amz_headers() {
        let at = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        assert_eq!(amz_date(at), "20150830T123600Z");
        assert_eq!(
            credential_scope(at, "us-east-1", "iam"),
            "20150830/us-east-1/iam/aws4_request"
        );
    }

    #[test]
    fn signature_is_lowercase_hex_and_date_bound() {
        let at = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2015, 8, 31, 12, 36, 0).unwrap();
        let signature = sign_hex(EXAMPLE_SECRET, at, "us-east-1", "s3", "policy");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(signature, sign_hex(EXAMPLE_SECRET, next_day, "us-east-1", "s3", "policy"));
    }
}
