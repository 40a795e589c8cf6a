/// Tenant domain for a user, taken from the email's host part. Identities
/// without an `@` (service accounts, bare usernames) map to the fallback.
pub fn domain_from_email(identity: &str, fallback: &str) -> String {
    match identity.split_once('@') {
        Some((_, domain)) if !domain.is_empty() => domain.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_yields_its_domain() {
        assert_eq!(
            domain_from_email("staff@ksrce.ac.in", "fallback.example"),
            "ksrce.ac.in"
        );
    }

    #[test]
    fn bare_identities_fall_back() {
        assert_eq!(domain_from_email("svc-ingest", "ksrce.ac.in"), "ksrce.ac.in");
        assert_eq!(domain_from_email("broken@", "ksrce.ac.in"), "ksrce.ac.in");
    }
}
