//! Transactional email: team notifications and site links for agents.
//!
//! Messages are rendered from Askama templates (HTML + plain text) and sent
//! either through an HTTP email API or over SMTP via lettre, depending on
//! configuration. Sending is best effort: callers log failures and carry on.

mod api;

pub use api::EmailApiClient;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{EmailConfig, EmailTransportConfig};

use self::api::SendEmailRequest;

#[derive(Template)]
#[template(path = "email/admin_added.html")]
struct AdminAddedEmailHtml<'a> {
    name: &'a str,
    email: &'a str,
    role: &'a str,
    author: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/admin_added.txt")]
struct AdminAddedEmailText<'a> {
    name: &'a str,
    email: &'a str,
    role: &'a str,
    author: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/admin_removed.html")]
struct AdminRemovedEmailHtml<'a> {
    name: &'a str,
    email: &'a str,
    author: &'a str,
}

#[derive(Template)]
#[template(path = "email/admin_removed.txt")]
struct AdminRemovedEmailText<'a> {
    name: &'a str,
    email: &'a str,
    author: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/site_published.html")]
struct SitePublishedEmailHtml<'a> {
    name: &'a str,
    site_url: &'a str,
    created: bool,
}

#[derive(Template)]
#[template(path = "email/site_published.txt")]
struct SitePublishedEmailText<'a> {
    name: &'a str,
    site_url: &'a str,
    created: bool,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email API rejected the message.
    #[error("Email API error: {0}")]
    Api(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
enum Transport {
    Api(EmailApiClient),
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay or the HTTP client cannot be set up.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = match &config.transport {
            EmailTransportConfig::Api { base_url, api_key } => {
                Transport::Api(EmailApiClient::new(base_url, api_key)?)
            }
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
            } => {
                let credentials =
                    Credentials::new(username.clone(), password.expose_secret().to_string());
                let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                    .port(*port)
                    .credentials(credentials)
                    .build();
                Transport::Smtp(mailer)
            }
        };

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    /// Tell a super admin that someone joined the team.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_admin_added(
        &self,
        to: &str,
        name: &str,
        email: &str,
        role: &str,
        author: &str,
        dashboard_url: &str,
    ) -> Result<(), EmailError> {
        let html = AdminAddedEmailHtml {
            name,
            email,
            role,
            author,
            dashboard_url,
        }
        .render()?;
        let text = AdminAddedEmailText {
            name,
            email,
            role,
            author,
            dashboard_url,
        }
        .render()?;

        self.send_multipart_email(to, &format!("New admin: {name}"), &text, &html)
            .await
    }

    /// Tell a super admin that someone left the team.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_admin_removed(
        &self,
        to: &str,
        name: &str,
        email: &str,
        author: &str,
    ) -> Result<(), EmailError> {
        let html = AdminRemovedEmailHtml {
            name,
            email,
            author,
        }
        .render()?;
        let text = AdminRemovedEmailText {
            name,
            email,
            author,
        }
        .render()?;

        self.send_multipart_email(to, &format!("Admin removed: {name}"), &text, &html)
            .await
    }

    /// Welcome a newly added admin.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_welcome(
        &self,
        to: &str,
        name: &str,
        dashboard_url: &str,
    ) -> Result<(), EmailError> {
        let html = WelcomeEmailHtml {
            name,
            dashboard_url,
        }
        .render()?;
        let text = WelcomeEmailText {
            name,
            dashboard_url,
        }
        .render()?;

        self.send_multipart_email(to, "Welcome to the Vitrine dashboard", &text, &html)
            .await
    }

    /// Send an agent the link to their site after it was created or updated.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_site_published(
        &self,
        to: &str,
        name: &str,
        site_url: &str,
        created: bool,
    ) -> Result<(), EmailError> {
        let html = SitePublishedEmailHtml {
            name,
            site_url,
            created,
        }
        .render()?;
        let text = SitePublishedEmailText {
            name,
            site_url,
            created,
        }
        .render()?;

        let subject = if created {
            "Your Vitrine site is live"
        } else {
            "Your Vitrine site was updated"
        };

        self.send_multipart_email(to, subject, &text, &html).await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Api(client) => {
                let id = client
                    .send(&SendEmailRequest {
                        from: &self.from_address,
                        to: vec![to],
                        subject,
                        html: html_body,
                        text: text_body,
                    })
                    .await?;
                tracing::info!(to = %to, subject = %subject, message_id = %id, "Email sent successfully");
            }
            Transport::Smtp(mailer) => {
                let email = Message::builder()
                    .from(
                        self.from_address
                            .parse()
                            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
                    )
                    .to(to
                        .parse()
                        .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
                    .subject(subject)
                    .multipart(
                        MultiPart::alternative()
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_PLAIN)
                                    .body(text_body.to_string()),
                            )
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_HTML)
                                    .body(html_body.to_string()),
                            ),
                    )?;

                mailer.send(email).await?;
                tracing::info!(to = %to, subject = %subject, "Email sent successfully");
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            Transport::Api(_) => "api",
            Transport::Smtp(_) => "smtp",
        };
        f.debug_struct("EmailService")
            .field("transport", &transport)
            .field("from_address", &self.from_address)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn api_config(base_url: String) -> EmailConfig {
        EmailConfig {
            from_address: "Vitrine <noreply@vitrine-immo.fr>".to_string(),
            transport: EmailTransportConfig::Api {
                base_url,
                api_key: SecretString::from("re_test_key"),
            },
        }
    }

    #[test]
    fn test_site_published_templates_include_link() {
        let html = SitePublishedEmailHtml {
            name: "Paul Durand",
            site_url: "https://paul-durand.vitrine-immo.fr",
            created: true,
        }
        .render()
        .unwrap();
        assert!(html.contains("https://paul-durand.vitrine-immo.fr"));
        assert!(html.contains("Paul Durand"));

        let text = SitePublishedEmailText {
            name: "Paul Durand",
            site_url: "https://paul-durand.vitrine-immo.fr",
            created: false,
        }
        .render()
        .unwrap();
        assert!(text.contains("https://paul-durand.vitrine-immo.fr"));
        assert!(text.contains("updated"));
    }

    #[test]
    fn test_html_templates_escape_names() {
        let html = AdminRemovedEmailHtml {
            name: "<script>alert(1)</script>",
            email: "x@example.fr",
            author: "Claire",
        }
        .render()
        .unwrap();
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_send_site_published_through_api() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(body_string_contains("paul-durand.localhost:3000"))
            .and(body_string_contains("paul.durand@example.fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m1"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = EmailService::new(&api_config(server.uri())).unwrap();
        service
            .send_site_published(
                "paul.durand@example.fr",
                "Paul Durand",
                "http://paul-durand.localhost:3000",
                true,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_admin_added_through_api() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(body_string_contains("New admin: Claire Martin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m2"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = EmailService::new(&api_config(server.uri())).unwrap();
        service
            .send_admin_added(
                "root@vitrine-immo.fr",
                "Claire Martin",
                "claire@vitrine-immo.fr",
                "Admin",
                "Root",
                "http://localhost:3000/admin",
            )
            .await
            .unwrap();
    }
}
