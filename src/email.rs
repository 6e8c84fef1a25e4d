//! HTML report rendering and SMTP delivery.
//!
//! Rendering is pure (report in, HTML out) so it can be tested without a
//! mail server; delivery is a leaf effect behind [`send`].

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailConfig;
use crate::report::Report;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the aggregated report as a self-contained HTML email body.
pub fn render_html(report: &Report) -> String {
    let mut html = String::new();
    html.push_str(
        "<html><head><style>\
         body { font-family: -apple-system, Segoe UI, Roboto, Arial, sans-serif; color: #111; }\
         .week { padding: 12px 0; border-top: 1px solid #eee; }\
         .title { font-size: 16px; font-weight: 700; margin: 0 0 8px; }\
         .sub { font-size: 13px; color: #444; margin: 0 0 10px; }\
         .best { background: #f6f8fa; padding: 10px; border-radius: 10px; margin: 8px 0 12px; }\
         .card { border: 1px solid #eee; border-radius: 12px; padding: 10px 12px; margin: 10px 0; }\
         .card h4 { margin: 0 0 6px; font-size: 13px; color: #333; }\
         .price { font-size: 20px; font-weight: 800; margin: 2px 0 8px; }\
         .delta-down { color: #1a7f37; font-weight: 700; }\
         .delta-up { color: #cf222e; font-weight: 700; }\
         .delta-flat { color: #666; font-weight: 700; }\
         .line { font-size: 13px; color: #222; margin: 3px 0; }\
         .muted { color: #666; }\
         .origin { font-weight: 700; }\
         </style></head><body>",
    );
    html.push_str(&format!(
        "<h2>Weekend flights monitor — {}</h2>",
        report.generated_on
    ));
    html.push_str(&format!(
        "<p class=\"sub\">Departure windows: {}</p>",
        escape(&report.window_label)
    ));

    for weekend in &report.weekends {
        html.push_str("<div class=\"week\">");
        html.push_str(&format!(
            "<p class=\"title\">Weekend starting {}</p>",
            weekend.week_start
        ));

        html.push_str("<div class=\"best\">");
        match weekend.best_price {
            Some(p) => html.push_str(&format!(
                "<div class=\"sub\"><b>Best this weekend:</b> {:.2} {}</div>",
                p, report.currency
            )),
            None => html.push_str(
                "<div class=\"sub\"><b>Best this weekend:</b> no qualifying fare found</div>",
            ),
        }
        html.push_str("</div>");

        for route in &weekend.routes {
            html.push_str(&format!(
                "<div class=\"sub\"><span class=\"origin\">{} → {}</span></div>",
                escape(&route.origin),
                escape(&route.destination)
            ));

            for pr in &route.patterns {
                html.push_str("<div class=\"card\">");
                html.push_str(&format!("<h4>{}</h4>", escape(pr.pattern.label())));

                match pr.best() {
                    Some(best) => {
                        html.push_str(&format!(
                            "<div class=\"price\">{:.2} {}",
                            best.price, best.currency
                        ));
                        if let Some(delta) = pr.delta {
                            let class = if delta < 0.0 {
                                "delta-down"
                            } else if delta > 0.0 {
                                "delta-up"
                            } else {
                                "delta-flat"
                            };
                            html.push_str(&format!(
                                " <span class=\"{class}\">{delta:+.2}</span>"
                            ));
                        }
                        html.push_str("</div>");

                        for (idx, it) in pr.itineraries.iter().enumerate() {
                            let flight = it.outbound.flight_number.as_deref().unwrap_or("");
                            let carrier = it.outbound.carrier_code.as_deref().unwrap_or("");
                            html.push_str(&format!(
                                "<div class=\"line\">{}) {:.2} {} <span class=\"muted\">{}</span> \
                                 OUT {} {} | IN {}</div>",
                                idx + 1,
                                it.price,
                                escape(&it.currency),
                                escape(carrier),
                                escape(flight),
                                it.outbound.departure_local.format("%a %H:%M"),
                                it.inbound.departure_local.format("%a %H:%M"),
                            ));
                        }
                    }
                    None => {
                        html.push_str(
                            "<div class=\"line muted\">no qualifying fare found</div>",
                        );
                    }
                }
                html.push_str("</div>");
            }
        }
        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    html
}

/// Send the rendered report over SMTP (STARTTLS, credential auth). The
/// password comes from the environment variable named in the config.
pub fn send(cfg: &EmailConfig, html_body: String) -> Result<()> {
    let password = std::env::var(&cfg.smtp_pass_env)
        .with_context(|| format!("Missing required env var: {}", cfg.smtp_pass_env))?;

    let message = Message::builder()
        .from(cfg.smtp_user.parse().context("Invalid sender address")?)
        .to(cfg.to.parse().context("Invalid recipient address")?)
        .subject(&cfg.subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body)
        .context("Failed to build email message")?;

    let mailer = SmtpTransport::starttls_relay(&cfg.smtp_host)
        .context("Failed to configure SMTP relay")?
        .port(cfg.smtp_port)
        .credentials(Credentials::new(cfg.smtp_user.clone(), password))
        .build();

    mailer.send(&message).context("SMTP delivery failed")?;
    Ok(())
}
