//! Server-rendered pages.
//!
//! Self-contained HTML with inline styles, no external resources. Pages
//! are built per request from small render helpers; every user-derived
//! value passes through [`escape`] at the render boundary. The callback
//! bridge page is fully static and lives in a const.

/// Minimal HTML escaping for text and attribute positions.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

const PAGE_STYLE: &str = r#"
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917;
      min-height: 100vh; display: flex; flex-direction: column;
      align-items: center; padding: 48px 24px;
    }
    main { width: 100%; max-width: 680px; }
    h1 { font-size: 24px; margin-bottom: 8px; }
    h2 { font-size: 18px; margin: 24px 0 8px; }
    p.lead { color: #78716c; font-size: 14px; margin-bottom: 24px; }
    form { display: flex; flex-direction: column; gap: 12px; margin-bottom: 16px; }
    label { font-size: 13px; color: #44403c; font-weight: 500; }
    input[type="email"], input[type="password"], textarea {
      width: 100%; padding: 12px; font-size: 15px;
      border: 2px solid #d6d3d1; border-radius: 12px; outline: none;
      font-family: inherit;
    }
    input:focus, textarea:focus { border-color: #4a7c59; }
    textarea { min-height: 260px; resize: vertical; }
    .row { display: flex; gap: 12px; }
    .btn {
      display: inline-flex; align-items: center; justify-content: center;
      padding: 12px 20px; border-radius: 12px; font-size: 15px; font-weight: 500;
      cursor: pointer; border: none; text-decoration: none;
    }
    .btn-primary { background: #4a7c59; color: white; }
    .btn-secondary { background: white; color: #44403c; border: 1px solid #d6d3d1; }
    .alert { padding: 12px 16px; border-radius: 12px; font-size: 14px; margin-bottom: 16px; }
    .alert.error { background: #fef2f2; color: #dc2626; }
    .alert.warning { background: #fffbeb; color: #b45309; }
    .alert.success { background: #f0fdf4; color: #16a34a; }
    .alert.notice { background: #eff6ff; color: #1d4ed8; }
    .session-bar {
      display: flex; align-items: center; justify-content: space-between;
      margin-bottom: 24px; gap: 12px;
    }
    .output {
      background: white; border: 1px solid #d6d3d1; border-radius: 12px;
      padding: 20px; margin-top: 8px;
    }
    .output pre {
      white-space: pre-wrap; word-wrap: break-word;
      font-family: inherit; font-size: 14px; line-height: 1.6;
    }
    hr { border: none; border-top: 1px solid #e7e5e4; margin: 24px 0; }
"#;

fn shell(title: &str, body: &str) -> String {
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>{PAGE_STYLE}</style>
</head>
<body>
  <main>
{body}
  </main>
</body>
</html>
"#
    )
}

fn alert(class: &str, message: &str) -> String {
    format!("<p class=\"alert {class}\">{}</p>\n", escape(message))
}

/// Login view, password variant: email + password with "Log In" and
/// "Create Account" actions.
pub fn login_password_page(email: &str, error: Option<&str>) -> String {
    let alert_html = error.map(|m| alert("error", m)).unwrap_or_default();
    let email = escape(email);
    let body = format!(
        r#"    <h1>📝 FPN Assistant – Training Simulation</h1>
    <p class="lead">Secure Login</p>
{alert_html}    <form method="post" action="/auth/login">
      <label for="email">Email</label>
      <input type="email" id="email" name="email" value="{email}" autocomplete="username">
      <label for="password">Password</label>
      <input type="password" id="password" name="password" autocomplete="current-password">
      <div class="row">
        <button class="btn btn-primary" type="submit">Log In</button>
        <button class="btn btn-secondary" type="submit" formaction="/auth/signup">Create Account</button>
      </div>
    </form>"#
    );
    shell("FPN Assistant – Log In", &body)
}

/// Login view, magic-link variant: email only, one-time link by mail.
pub fn login_magic_page(email: &str, error: Option<&str>, notice: Option<&str>) -> String {
    let mut alerts = String::new();
    if let Some(m) = error {
        alerts.push_str(&alert("error", m));
    }
    if let Some(m) = notice {
        alerts.push_str(&alert("notice", m));
    }
    let email = escape(email);
    let body = format!(
        r#"    <h1>📝 FPN Assistant – Training Simulation</h1>
    <p class="lead">Secure Login — a one-time sign-in link will be emailed to you.</p>
{alerts}    <form method="post" action="/auth/magic-link">
      <label for="email">Email</label>
      <input type="email" id="email" name="email" value="{email}" autocomplete="username">
      <div class="row">
        <button class="btn btn-primary" type="submit">Send Magic Link</button>
      </div>
    </form>"#
    );
    shell("FPN Assistant – Log In", &body)
}

/// Post-login view: narrative entry plus, after a generation, the
/// training output and its download link.
pub fn main_page(
    email: &str,
    narrative: &str,
    note: Option<&str>,
    warning: Option<&str>,
) -> String {
    let warning_html = warning.map(|m| alert("warning", m)).unwrap_or_default();
    let output_html = note
        .map(|n| {
            format!(
                r#"    <hr>
    <h2>Training Output</h2>
    <div class="output"><pre>{}</pre></div>
    <p style="margin-top: 16px;"><a class="btn btn-secondary" href="/download">📄 Download Training Output</a></p>
"#,
                escape(n)
            )
        })
        .unwrap_or_default();
    let email_html = escape(email);
    let narrative_html = escape(narrative);
    let body = format!(
        r#"    <h1>📝 FPN Assistant – Training Simulation</h1>
    <div class="session-bar">
      <p class="alert success" style="margin: 0;">Logged in as {email_html}</p>
      <form method="post" action="/auth/logout" style="margin: 0;">
        <button class="btn btn-secondary" type="submit">Logout</button>
      </form>
    </div>
    <h2>Enter Fictional or De-Identified Session Material</h2>
    <p class="lead">Paste a <strong>fictional</strong> or fully <strong>de-identified</strong> case scenario,
    mock session description, or practice notes. The assistant will respond as a
    <strong>training simulation</strong> using the AIC-Flex format.</p>
{warning_html}    <form method="post" action="/generate">
      <label for="narrative">Case / Session Description</label>
      <textarea id="narrative" name="narrative">{narrative_html}</textarea>
      <div class="row">
        <button class="btn btn-primary" type="submit">Generate Training Note</button>
      </div>
    </form>
{output_html}"#
    );
    shell("FPN Assistant", &body)
}

/// Generic error page for the few real HTTP faults.
pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "    <h1>{}</h1>\n    <p class=\"lead\">{}</p>\n    <p><a class=\"btn btn-secondary\" href=\"/\">Back</a></p>",
        escape(title),
        escape(message)
    );
    shell("FPN Assistant", &body)
}

/// Step 1 of the magic-link callback: the provider delivers the token
/// pair in the URL fragment, which never reaches the server. This page
/// rewrites the fragment into query parameters and redirects to
/// `/auth/complete`, where the server-side handler can read them.
pub const CALLBACK_BRIDGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>FPN Assistant – Signing you in</title>
  <style>
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917;
      min-height: 100vh; display: flex; align-items: center; justify-content: center;
    }
    p { color: #78716c; font-size: 15px; }
  </style>
</head>
<body>
  <p id="status">Signing you in…</p>
  <script>
    (function () {
      var hash = window.location.hash;
      if (hash && hash.indexOf('access_token') !== -1) {
        window.location.replace('/auth/complete?' + hash.substring(1));
      } else {
        document.getElementById('status').textContent =
          'No sign-in tokens were found in this link. Please request a new one.';
      }
    })();
  </script>
</body>
</html>
"#;
