use crate::server::api::{self, AppState};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

fn json_or_500(payload: Result<String, serde_json::Error>) -> HttpResponse {
    match payload {
        Ok(body) => HttpResponse::json(body),
        Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
    }
}

pub fn route_request(state: &AppState, method: &str, path: &str, body: &str) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    match (method, path) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/html; charset=utf-8",
            body: INDEX_HTML.to_string(),
        },
        ("GET", "/api/health") => json_or_500(api::health_payload(state)),
        ("GET", "/api/units") => json_or_500(api::units_payload(state)),
        ("GET", "/api/skills") => json_or_500(api::skills_payload(state)),
        ("GET", "/api/tuning") => json_or_500(api::tuning_payload(state)),
        ("GET", "/api/presets") => json_or_500(api::presets_payload(state)),
        ("POST", "/api/simulate") => match api::simulate_payload(state, body) {
            Ok(payload) => HttpResponse::json(payload),
            Err(api::SimulateError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
            Err(api::SimulateError::Config(err)) => error_response(400, "Bad Request", &err.to_string()),
            Err(api::SimulateError::Internal(msg)) => {
                tracing::error!(error = %msg, "simulation failed");
                error_response(500, "Internal Server Error", &msg)
            }
        },
        (_, "/api/simulate") => error_response(405, "Method Not Allowed", "Use POST"),
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Shinsen Battle Simulator</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    textarea { width: 100%; min-height: 160px; font-family: monospace; }
    input { width: 120px; padding: 6px; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Shinsen Battle Simulator</h1>

  <div class="card">
    <button id="units-btn">GET /api/units</button>
    <button id="skills-btn">GET /api/skills</button>
    <button id="tuning-btn">GET /api/tuning</button>
  </div>

  <div class="card">
    <strong>Simulate</strong>
    <textarea id="matchup">{
  "a": [{ "unit_id": "U001" }],
  "b": [{ "unit_id": "U002" }]
}</textarea>
    <label>Runs <input id="runs" type="number" min="1" max="100000" value="500" /></label>
    <label>Seed <input id="seed" type="number" min="0" value="1" /></label>
    <div><button id="simulate-btn">POST /api/simulate</button></div>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    async function request(path, options) {
      output.textContent = 'Loading…';
      const response = await fetch(path, options);
      output.textContent = 'HTTP ' + response.status + '\n' + await response.text();
    }
    document.getElementById('units-btn').addEventListener('click', () => request('/api/units'));
    document.getElementById('skills-btn').addEventListener('click', () => request('/api/skills'));
    document.getElementById('tuning-btn').addEventListener('click', () => request('/api/tuning'));
    document.getElementById('simulate-btn').addEventListener('click', () => {
      let payload;
      try { payload = JSON.parse(document.getElementById('matchup').value); }
      catch (e) { output.textContent = 'Invalid matchup JSON: ' + e; return; }
      payload.n = Number(document.getElementById('runs').value) || 500;
      payload.seed = Number(document.getElementById('seed').value) || 0;
      request('/api/simulate', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload),
      });
    });
  </script>
</body>
</html>
"#;
