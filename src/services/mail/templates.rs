// Gabarits HTML des emails transactionnels
// Chaque gabarit renvoie (sujet, html). Toute valeur saisie par un
// utilisateur passe par escape_html.

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub struct WebinarEmail<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub time_zone: &'a str,
    pub duration_minutes: i64,
    pub meet_link: Option<&'a str>,
    pub calendar_link: Option<&'a str>,
    pub host_name: &'a str,
    pub host_email: &'a str,
}

pub struct PurchaseEmail<'a> {
    pub buyer_name: &'a str,
    pub buyer_email: &'a str,
    pub purchase_date: &'a str,
    pub amount: &'a str,
    pub currency: &'a str,
}

pub struct LeadMagnetEmail<'a> {
    pub recipient_name: &'a str,
    pub product_title: &'a str,
    pub product_description: &'a str,
    /// Lien de téléchargement, absent pour un simple remerciement
    pub download_url: Option<&'a str>,
    pub file_name: Option<&'a str>,
    pub host_name: &'a str,
}

const WEBINAR_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: #db4c2a; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }
    .content { background: #f9f9f9; padding: 20px; border-radius: 0 0 8px 8px; }
    .webinar-details { background: white; padding: 20px; margin: 20px 0; border-radius: 8px; border-left: 4px solid #db4c2a; }
    .detail-row { margin: 10px 0; }
    .label { font-weight: bold; color: #db4c2a; }
    .button { display: inline-block; padding: 12px 24px; background: #db4c2a; color: white; text-decoration: none; border-radius: 6px; margin: 10px 5px; }
    .important { background: #fff3cd; padding: 15px; margin: 15px 0; border-radius: 6px; border-left: 4px solid #ffc107; }
    .footer { margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd; font-size: 14px; color: #666; }
"#;

const LEAD_STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f5f5f5; }
    .container { background: white; border-radius: 12px; overflow: hidden; }
    .header { background: linear-gradient(135deg, #ea580c, #dc2626); color: white; padding: 30px 20px; text-align: center; }
    .content { padding: 30px 20px; }
    .download-section { background: #f8fafc; padding: 25px; margin: 25px 0; border-radius: 8px; border-left: 4px solid #ea580c; text-align: center; }
    .download-button { display: inline-block; padding: 15px 30px; background: #ea580c; color: white; text-decoration: none; border-radius: 8px; font-weight: 600; }
    .highlight-box { background: #f0fdf4; padding: 20px; margin: 20px 0; border-radius: 8px; border-left: 4px solid #22c55e; }
    .footer { background: #f8fafc; padding: 20px; text-align: center; font-size: 14px; color: #6b7280; }
"#;

fn link_button(href: Option<&str>, label: &str) -> String {
    match href {
        Some(href) if !href.is_empty() => format!(
            r#"<a href="{}" class="button">{}</a>"#,
            escape_html(href),
            label
        ),
        _ => String::new(),
    }
}

fn webinar_details_block(webinar: &WebinarEmail<'_>) -> String {
    format!(
        r#"<div class="webinar-details">
      <h2>{title}</h2>
      <div class="detail-row"><span class="label">Date:</span> {date}</div>
      <div class="detail-row"><span class="label">Time:</span> {time} ({tz})</div>
      <div class="detail-row"><span class="label">Duration:</span> {duration} minutes</div>
      <div class="detail-row"><span class="label">Host:</span> {host}</div>
    </div>"#,
        title = escape_html(webinar.title),
        date = escape_html(webinar.date),
        time = escape_html(webinar.time),
        tz = escape_html(webinar.time_zone),
        duration = webinar.duration_minutes,
        host = escape_html(webinar.host_name),
    )
}

pub fn webinar_confirmation(webinar: &WebinarEmail<'_>, purchase: &PurchaseEmail<'_>) -> (String, String) {
    let subject = format!("✅ Registration Confirmed: {}", webinar.title);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Webinar Registration Confirmed</title>
  <style>{style}</style>
</head>
<body>
  <div class="header">
    <h1>🎉 Registration Confirmed!</h1>
    <p>You're all set for the webinar</p>
  </div>
  <div class="content">
    <p>Hi {buyer},</p>
    <p>Thank you for registering! You're confirmed for the upcoming webinar.</p>
    {details}
    <div class="important"><strong>📅 Important:</strong> Add this webinar to your calendar so you don't miss it!</div>
    <div style="text-align: center; margin: 30px 0;">{meet}{calendar}</div>
    <h3>What to expect:</h3>
    <p>{description}</p>
    <div class="important"><strong>📝 Note:</strong> You'll receive a reminder email 24 hours before the webinar with the meeting details.</div>
    <h3>Purchase Details:</h3>
    <div class="detail-row"><span class="label">Amount Paid:</span> {amount} {currency}</div>
    <div class="detail-row"><span class="label">Purchase Date:</span> {purchase_date}</div>
    <div class="detail-row"><span class="label">Buyer Email:</span> {buyer_email}</div>
    <p>If you have any questions before the webinar, feel free to contact the host at <a href="mailto:{host_email}">{host_email}</a>.</p>
    <p>Best regards,<br>{host}</p>
  </div>
  <div class="footer">
    <p>This is an automated confirmation email for your webinar registration.</p>
  </div>
</body>
</html>"#,
        style = WEBINAR_STYLE,
        buyer = escape_html(purchase.buyer_name),
        details = webinar_details_block(webinar),
        meet = link_button(webinar.meet_link, "Join Google Meet"),
        calendar = link_button(webinar.calendar_link, "Add to Calendar"),
        description = escape_html(webinar.description),
        amount = escape_html(purchase.amount),
        currency = escape_html(purchase.currency),
        purchase_date = escape_html(purchase.purchase_date),
        buyer_email = escape_html(purchase.buyer_email),
        host_email = escape_html(webinar.host_email),
        host = escape_html(webinar.host_name),
    );
    (subject, html)
}

pub fn webinar_reminder(webinar: &WebinarEmail<'_>, purchase: &PurchaseEmail<'_>) -> (String, String) {
    let subject = format!("⏰ Tomorrow: {}", webinar.title);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Webinar Starting Tomorrow</title>
  <style>{style}</style>
</head>
<body>
  <div class="header">
    <h1>⏰ Webinar Reminder</h1>
    <p>Your webinar is starting soon!</p>
  </div>
  <div class="content">
    <p>Hi {buyer},</p>
    <div class="important"><strong>🕐 Reminder:</strong> Your webinar "{title}" is starting tomorrow at {time} ({tz}).</div>
    {details}
    <div style="text-align: center; margin: 30px 0;">{meet}</div>
    <h3>Pre-webinar checklist:</h3>
    <ul>
      <li>✅ Test your camera and microphone</li>
      <li>✅ Ensure stable internet connection</li>
      <li>✅ Join 5-10 minutes early</li>
    </ul>
    <p>See you tomorrow!</p>
    <p>Best regards,<br>{host}</p>
  </div>
</body>
</html>"#,
        style = WEBINAR_STYLE,
        buyer = escape_html(purchase.buyer_name),
        title = escape_html(webinar.title),
        time = escape_html(webinar.time),
        tz = escape_html(webinar.time_zone),
        details = webinar_details_block(webinar),
        meet = link_button(webinar.meet_link, "Join Google Meet"),
        host = escape_html(webinar.host_name),
    );
    (subject, html)
}

pub fn lead_magnet(data: &LeadMagnetEmail<'_>) -> (String, String) {
    let description = if data.product_description.trim().is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", escape_html(data.product_description))
    };

    match data.download_url.filter(|url| !url.is_empty()) {
        Some(url) => {
            let subject = format!("🎉 Your Free Download: {}", data.product_title);
            let html = format!(
                r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Your Free Download - {title}</title>
  <style>{style}</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>🎉 Your Download is Ready!</h1>
      <p>Thanks for subscribing - here's your free resource</p>
    </div>
    <div class="content">
      <p>Hi {name},</p>
      <p>Thank you for your interest in "<strong>{title}</strong>"!</p>
      {description}
      <div class="download-section">
        <h3>📥 Download Your Free Resource</h3>
        <a href="{url}" class="download-button">Download {file_name}</a>
        <p><strong>🔒 Secure Download:</strong> This link is valid for 24 hours and can only be used with your email address.</p>
      </div>
      <p>Best regards,<br><strong>{host}</strong></p>
    </div>
    <div class="footer">
      <p>This email was sent because you requested a free download from {host}.</p>
    </div>
  </div>
</body>
</html>"#,
                style = LEAD_STYLE,
                title = escape_html(data.product_title),
                name = escape_html(data.recipient_name),
                description = description,
                url = escape_html(url),
                file_name = escape_html(data.file_name.unwrap_or("Resource")),
                host = escape_html(data.host_name),
            );
            (subject, html)
        }
        None => {
            let subject = format!("✅ Thank you for your interest: {}", data.product_title);
            let html = format!(
                r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Thank you - {title}</title>
  <style>{style}</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>✅ Thank You!</h1>
      <p>We've received your information</p>
    </div>
    <div class="content">
      <p>Hi {name},</p>
      <p>Thank you for your interest in "<strong>{title}</strong>"!</p>
      {description}
      <div class="highlight-box">
        <p><strong>✨ What happens next?</strong></p>
        <p>We've received your information and will be in touch soon with more details and exclusive content.</p>
      </div>
      <p>Best regards,<br><strong>{host}</strong></p>
    </div>
    <div class="footer">
      <p>This email was sent because you requested information from {host}.</p>
    </div>
  </div>
</body>
</html>"#,
                style = LEAD_STYLE,
                title = escape_html(data.product_title),
                name = escape_html(data.recipient_name),
                description = description,
                host = escape_html(data.host_name),
            );
            (subject, html)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webinar() -> WebinarEmail<'static> {
        WebinarEmail {
            title: "Rust <Live>",
            description: "Q&A",
            date: "2025-03-10",
            time: "14:00",
            time_zone: "Europe/Paris",
            duration_minutes: 90,
            meet_link: Some("https://meet.google.com/abc"),
            calendar_link: None,
            host_name: "Jane",
            host_email: "jane@x.com",
        }
    }

    fn purchase() -> PurchaseEmail<'static> {
        PurchaseEmail {
            buyer_name: "Bob",
            buyer_email: "bob@x.com",
            purchase_date: "2025-03-01",
            amount: "25",
            currency: "USD",
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn confirmation_subject_and_escaping() {
        let (subject, html) = webinar_confirmation(&webinar(), &purchase());
        assert_eq!(subject, "✅ Registration Confirmed: Rust <Live>");
        assert!(html.contains("Rust &lt;Live&gt;"));
        assert!(html.contains("Join Google Meet"));
        assert!(!html.contains("Add to Calendar"));
        assert!(html.contains("90 minutes"));
    }

    #[test]
    fn reminder_subject() {
        let (subject, _) = webinar_reminder(&webinar(), &purchase());
        assert_eq!(subject, "⏰ Tomorrow: Rust <Live>");
    }

    #[test]
    fn lead_magnet_with_and_without_link() {
        let mut data = LeadMagnetEmail {
            recipient_name: "Jane",
            product_title: "Guide",
            product_description: "",
            download_url: Some("https://app.test/api/download/1?email=a&token=b"),
            file_name: None,
            host_name: "Host",
        };
        let (subject, html) = lead_magnet(&data);
        assert_eq!(subject, "🎉 Your Free Download: Guide");
        assert!(html.contains("Download Resource"));
        assert!(html.contains("email=a&amp;token=b"));

        data.download_url = None;
        let (subject, html) = lead_magnet(&data);
        assert_eq!(subject, "✅ Thank you for your interest: Guide");
        assert!(!html.contains("download-button\""));
    }
}
