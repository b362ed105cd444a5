//! Documentation viewer page.

/// URL the viewer loads the Swagger document from.
pub const SPEC_URL: &str = "/endpoints";

/// HTML shell that points Swagger UI at [`SPEC_URL`].
pub fn index_html(app_name: &str) -> String {
    let title = escape(app_name);
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <meta name="description" content="Documentation for {title}">

  <link rel='shortcut icon' type='image/x-icon' href='/favicon.ico'>
  <link rel="stylesheet" href="//unpkg.com/swagger-ui-dist@3/swagger-ui.css">
</head>

<body>
  <div id='swagger-ui'></div>
  <script src="//unpkg.com/swagger-ui-dist@3/swagger-ui-bundle.js"></script>
  <script>
    SwaggerUIBundle({{
      url: "{url}",
      dom_id: '#swagger-ui'
    }});
  </script>
</body>
</html>
"#,
        title = title,
        url = SPEC_URL,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
