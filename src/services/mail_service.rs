use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Default)]
pub struct MailArgs {
    pub subject: String,
    pub body: String,
    pub to: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub from_address: Option<String>,
}

/// Effective from address: explicit override wins, otherwise the configured
/// recruiter email. Resolved per message, so nothing leaks between sends.
pub fn resolve_from(override_from: Option<&str>, recruiter_email: Option<&str>) -> Option<String> {
    override_from
        .or(recruiter_email)
        .map(str::to_string)
}

/// Transactional mail composer. Delivery is a single post to the configured
/// relay; returns whether the relay accepted it. No retries — callers decide
/// what a failed send means for the user.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    relay_url: Option<String>,
}

impl MailService {
    pub fn new(relay_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url,
        }
    }

    pub async fn send(&self, mut args: MailArgs, recruiter_email: Option<&str>) -> bool {
        args.from_address = resolve_from(args.from_address.as_deref(), recruiter_email);

        let Some(relay_url) = &self.relay_url else {
            tracing::warn!(to = %args.to, "mail relay not configured, dropping message");
            return false;
        };

        match self.client.post(relay_url).json(&args).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::error!(status = %resp.status(), to = %args.to, "mail relay rejected message");
                false
            }
            Err(err) => {
                tracing::error!(error = ?err, to = %args.to, "mail relay unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_recruiter_email() {
        assert_eq!(
            resolve_from(Some("hiring@acme.test"), Some("recruiter@acme.test")),
            Some("hiring@acme.test".to_string())
        );
    }

    #[test]
    fn falls_back_to_recruiter_email() {
        assert_eq!(
            resolve_from(None, Some("recruiter@acme.test")),
            Some("recruiter@acme.test".to_string())
        );
    }

    #[test]
    fn no_source_means_no_from() {
        assert_eq!(resolve_from(None, None), None);
    }

    #[tokio::test]
    async fn unconfigured_relay_reports_failure() {
        let service = MailService::new(None);
        let sent = service
            .send(
                MailArgs {
                    subject: "New application".into(),
                    body: "A candidate applied".into(),
                    to: "recruiter@acme.test".into(),
                    ..Default::default()
                },
                None,
            )
            .await;
        assert!(!sent);
    }
}
