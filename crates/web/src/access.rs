use std::collections::HashSet;

use crate::config::Config;

/// Who may sign in and who is an admin, from the comma-separated env lists.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admin_emails: HashSet<String>,
    enforce_allowlist: bool,
    coach_emails: HashSet<String>,
    coach_domains: HashSet<String>,
}

impl AccessPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_emails: parse_list(&config.admin_emails),
            enforce_allowlist: config.enforce_coach_allowlist,
            coach_emails: parse_list(&config.coach_emails),
            coach_domains: parse_list(&config.coach_domains),
        }
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails.contains(&normalize_email(email))
    }

    /// Without an enforced allowlist everyone may sign in. Admins always may.
    pub fn is_allowed(&self, email: &str) -> bool {
        if !self.enforce_allowlist {
            return true;
        }

        let email = normalize_email(email);
        if self.admin_emails.contains(&email) || self.coach_emails.contains(&email) {
            return true;
        }

        email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| self.coach_domains.contains(domain))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_list(values: &str) -> HashSet<String> {
    values
        .split(',')
        .map(normalize_email)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enforce: bool) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: String::new(),
            admin_emails: " Admin@Example.com ,".to_string(),
            enforce_coach_allowlist: enforce,
            coach_emails: "coach@gmail.com".to_string(),
            coach_domains: "dojo.org, karate.in".to_string(),
            writes_enabled: true,
            session_ttl_minutes: 60,
        }
    }

    #[test]
    fn test_admin_lookup_is_case_insensitive() {
        let policy = AccessPolicy::from_config(&config(false));
        assert!(policy.is_admin("admin@example.com"));
        assert!(policy.is_admin("  ADMIN@example.COM"));
        assert!(!policy.is_admin("coach@gmail.com"));
    }

    #[test]
    fn test_allowlist_not_enforced_allows_everyone() {
        let policy = AccessPolicy::from_config(&config(false));
        assert!(policy.is_allowed("anyone@anywhere.net"));
    }

    #[test]
    fn test_enforced_allowlist() {
        let policy = AccessPolicy::from_config(&config(true));
        assert!(policy.is_allowed("Admin@example.com"));
        assert!(policy.is_allowed("COACH@gmail.com"));
        assert!(policy.is_allowed("sensei@dojo.org"));
        assert!(policy.is_allowed("x@Karate.IN"));
        assert!(!policy.is_allowed("someone@gmail.com"));
        assert!(!policy.is_allowed("dojo.org"));
        assert!(!policy.is_allowed(""));
    }
}
