use std::str::FromStr;

/// Built-in transactional email bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    VerifyEmail,
    ForgotPassword,
    ChangePassword,
    Notification,
}

impl FromStr for EmailTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "verifyEmail" => Ok(Self::VerifyEmail),
            "forgotPassword" => Ok(Self::ForgotPassword),
            "changePassword" => Ok(Self::ChangePassword),
            "notification" => Ok(Self::Notification),
            other => Err(format!("unknown email template: {other}")),
        }
    }
}

impl EmailTemplate {
    /// Renders the HTML body. `name` is escaped; `link` is inserted as an href.
    pub fn render(&self, name: &str, link: &str) -> String {
        let name = escape_html(name);
        let link = escape_html(link);
        let (heading, text, action) = match self {
            Self::VerifyEmail => (
                "Verify your account",
                "Please use the link below to verify your account. This link is valid for 1 hour.",
                "Verify Account",
            ),
            Self::ForgotPassword => (
                "Reset your password",
                "Please use the link below to reset your password. This link is valid for 1 hour.",
                "Reset Password",
            ),
            Self::ChangePassword => (
                "Your password was changed",
                "If you did not make this change, reset your password immediately.",
                "Reset Password",
            ),
            Self::Notification => (
                "You have a new notification",
                "Follow the link below for details.",
                "Open",
            ),
        };
        format!(
            r#"<html>
<body>
    <h2>{heading}</h2>
    <p>Hello {name},</p>
    <p>{text}</p>
    <p><a href="{link}" style="background:#007bff;color:#fff;padding:8px 16px;text-decoration:none;">{action}</a></p>
    <p>Regards,<br>The Auth Team</p>
</body>
</html>"#
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
