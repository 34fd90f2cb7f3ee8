//! Call-control document
//!
//! XML answer to the provider's incoming-call webhook: pause, optional
//! announcement, then connect the call audio to our media-stream websocket.

use std::fmt::Write as _;

use voice_relay_config::CallControlConfig;

/// Websocket URL the provider should stream call audio to
pub fn stream_url(host: &str, media_stream_path: &str) -> String {
    format!("wss://{}{}", host, media_stream_path)
}

/// Hostname part of a `Host` header value (port and surrounding space removed)
pub fn hostname(host_header: &str) -> Option<&str> {
    let host = host_header.trim();
    let name = match host.strip_prefix('[') {
        // bracketed IPv6 literal
        Some(rest) => rest.split_once(']').map(|(addr, _)| addr)?,
        None => host.split(':').next()?,
    };
    (!name.is_empty()).then_some(name)
}

pub fn render(call: &CallControlConfig, stream_url: &str) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n");

    if call.pause_secs > 0 {
        let _ = writeln!(xml, "  <Pause length=\"{}\"/>", call.pause_secs);
    }

    if let Some(text) = call.announcement.as_deref().filter(|t| !t.trim().is_empty()) {
        match call.announcement_language.as_deref() {
            Some(language) => {
                let _ = writeln!(
                    xml,
                    "  <Say language=\"{}\">{}</Say>",
                    escape(language),
                    escape(text)
                );
            }
            None => {
                let _ = writeln!(xml, "  <Say>{}</Say>", escape(text));
            }
        }
    }

    let _ = writeln!(xml, "  <Connect>\n    <Stream url=\"{}\"/>\n  </Connect>", escape(stream_url));
    xml.push_str("</Response>\n");
    xml
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("relay.example.com"), Some("relay.example.com"));
        assert_eq!(hostname("relay.example.com:8443"), Some("relay.example.com"));
        assert_eq!(hostname("[::1]:10000"), Some("::1"));
        assert_eq!(hostname(""), None);
        assert_eq!(hostname(":80"), None);
    }

    #[test]
    fn test_render_with_announcement() {
        let call = CallControlConfig {
            pause_secs: 1,
            announcement: Some("少々お待ちください。".into()),
            announcement_language: Some("ja-JP".into()),
        };
        let xml = render(&call, &stream_url("relay.example.com", "/media-stream"));

        let pause = xml.find("<Pause length=\"1\"/>").unwrap();
        let say = xml.find("<Say language=\"ja-JP\">少々お待ちください。</Say>").unwrap();
        let connect = xml
            .find("<Stream url=\"wss://relay.example.com/media-stream\"/>")
            .unwrap();
        assert!(pause < say && say < connect);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.trim_end().ends_with("</Response>"));
    }

    #[test]
    fn test_render_minimal() {
        let call = CallControlConfig {
            pause_secs: 0,
            announcement: None,
            announcement_language: None,
        };
        let xml = render(&call, "wss://h/ms");
        assert!(!xml.contains("<Pause"));
        assert!(!xml.contains("<Say"));
        assert!(xml.contains("<Connect>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let call = CallControlConfig {
            pause_secs: 0,
            announcement: Some("Tom & <Jerry>".into()),
            announcement_language: None,
        };
        let xml = render(&call, "wss://h/ms?a=1&b=\"2\"");
        assert!(xml.contains("<Say>Tom &amp; &lt;Jerry&gt;</Say>"));
        assert!(xml.contains("url=\"wss://h/ms?a=1&amp;b=&quot;2&quot;\""));
    }
}
